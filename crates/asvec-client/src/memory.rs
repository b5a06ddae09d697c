//! In-process cluster transport.
//!
//! [`MemoryCluster`] keeps nodes, indexes, users and records behind one
//! mutex and hands out [`AdminClient`]s that operate on that state. Topology
//! is configurable per node (advertised endpoints, which peers it sees,
//! whether the client can reach it, injected failures), which makes it
//! suitable for exercising discovery and visibility diagnostics. Every call
//! is appended to a request log that tests can inspect.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::client::{AdminClient, Connector, project_fields};
use crate::cluster::{About, ClusterEndpoints, ClusteringState, NodeId, NodeRole, ServerEndpoint};
use crate::connect::{ConnectOptions, Endpoint, HostPort};
use crate::error::{ClientError, Code, Result};
use crate::index::{
    DistanceMetric, HnswIndexUpdate, IndexDefinition, IndexId, IndexStatus, Labels,
};
use crate::record::{Key, Neighbor, Record, Role, SearchParams, User, Vector};

/// One of the four per-node facts a client can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fact {
    ConnectedEndpoint,
    ClusterEndpoints,
    ClusteringState,
    About,
}

/// A call received by the cluster.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Connect {
        endpoint: Endpoint,
        username: Option<String>,
    },
    IndexCreate(IndexDefinition),
    IndexUpdate {
        id: IndexId,
        labels: Option<Labels>,
        update: HnswIndexUpdate,
    },
    IndexDrop(IndexId),
    IndexList,
    IndexGet(IndexId),
    IndexStatus(IndexId),
    GcInvalidVertices {
        id: IndexId,
        cutoff: DateTime<Utc>,
    },
    UserCreate {
        username: String,
        roles: Vec<String>,
    },
    UserDrop(String),
    UserUpdateCredentials(String),
    UserGrantRoles {
        username: String,
        roles: Vec<String>,
    },
    UserRevokeRoles {
        username: String,
        roles: Vec<String>,
    },
    UserList,
    RoleList,
    NodeIds,
    ConnectedNodeEndpoint(Option<NodeId>),
    ClusterEndpoints {
        node: Option<NodeId>,
        listener_name: Option<String>,
    },
    ClusteringState(Option<NodeId>),
    About(Option<NodeId>),
    GetRecord {
        namespace: String,
        set: Option<String>,
        key: Key,
    },
    VectorSearch {
        namespace: String,
        index_name: String,
        query: Vector,
        limit: u32,
        ef: Option<u32>,
        include_fields: Option<Vec<String>>,
    },
}

impl Request {
    /// True for calls that change cluster state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::IndexCreate(_)
                | Self::IndexUpdate { .. }
                | Self::IndexDrop(_)
                | Self::GcInvalidVertices { .. }
                | Self::UserCreate { .. }
                | Self::UserDrop(_)
                | Self::UserUpdateCredentials(_)
                | Self::UserGrantRoles { .. }
                | Self::UserRevokeRoles { .. }
        )
    }
}

struct NodeState {
    endpoint: ServerEndpoint,
    listeners: BTreeMap<String, ServerEndpoint>,
    sees: BTreeSet<NodeId>,
    reachable: bool,
    in_cluster: bool,
    version: String,
    roles: Vec<NodeRole>,
    failing: BTreeSet<Fact>,
}

impl NodeState {
    fn endpoint_for(&self, listener_name: Option<&str>) -> ServerEndpoint {
        listener_name
            .and_then(|name| self.listeners.get(name))
            .unwrap_or(&self.endpoint)
            .clone()
    }

    fn serves(&self, host: &HostPort) -> bool {
        std::iter::once(&self.endpoint)
            .chain(self.listeners.values())
            .any(|ep| ep.address == host.host && ep.port == host.port)
    }
}

struct StoredIndex {
    definition: IndexDefinition,
    status: Option<IndexStatus>,
    last_gc: Option<DateTime<Utc>>,
}

struct StoredUser {
    password: String,
    roles: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RecordKey {
    namespace: String,
    set: Option<String>,
    key: Key,
}

struct State {
    cluster_id: u64,
    nodes: BTreeMap<NodeId, NodeState>,
    indexes: BTreeMap<IndexId, StoredIndex>,
    users: BTreeMap<String, StoredUser>,
    roles: BTreeSet<String>,
    records: BTreeMap<RecordKey, Record>,
    require_auth: bool,
    accept_any_host: bool,
    requests: Vec<Request>,
    open_clients: usize,
}

impl State {
    fn index(&self, namespace: &str, name: &str) -> Result<&StoredIndex> {
        self.indexes
            .get(&IndexId::new(namespace, name))
            .ok_or_else(|| ClientError::not_found(format!("index {namespace}.{name} not found")))
    }

    fn user(&mut self, username: &str) -> Result<&mut StoredUser> {
        self.users
            .get_mut(username)
            .ok_or_else(|| ClientError::not_found(format!("user {username} not found")))
    }

    fn check_roles(&self, roles: &[String]) -> Result<()> {
        match roles.iter().find(|role| !self.roles.contains(*role)) {
            Some(unknown) => Err(ClientError::invalid_argument(format!(
                "unknown role {unknown}"
            ))),
            None => Ok(()),
        }
    }

    fn resolve_host(&self, host: &HostPort) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| node.serves(host))
            .map(|(id, _)| *id)
            .or_else(|| {
                if self.accept_any_host {
                    self.nodes.keys().next().copied()
                } else {
                    None
                }
            })
    }

    fn reachable(&self, id: NodeId) -> bool {
        self.nodes.get(&id).is_some_and(|node| node.reachable)
    }

    fn fact(&self, id: NodeId, fact: Fact) -> Result<&NodeState> {
        let node = self
            .nodes
            .get(&id)
            .ok_or_else(|| ClientError::not_found(format!("node {id} not found")))?;
        if node.failing.contains(&fact) {
            return Err(ClientError::status(
                Code::Unavailable,
                format!("node {id} did not respond"),
            ));
        }
        Ok(node)
    }

    fn indexed_records<'a>(
        &'a self,
        definition: &'a IndexDefinition,
    ) -> impl Iterator<Item = (&'a RecordKey, &'a Record, Vector)> + 'a {
        self.records.iter().filter_map(move |(key, record)| {
            if key.namespace != definition.id.namespace {
                return None;
            }
            if definition.set_filter.is_some() && key.set != definition.set_filter {
                return None;
            }
            let vector = record.data.get(&definition.field)?.as_vector()?;
            (vector.len() == definition.dimensions as usize).then_some((key, record, vector))
        })
    }
}

/// An in-process vector search cluster.
///
/// Cloning is cheap; clones share state.
#[derive(Clone)]
pub struct MemoryCluster {
    state: Arc<Mutex<State>>,
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCluster {
    /// An empty cluster with the built-in roles and no nodes.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                cluster_id: 1,
                nodes: BTreeMap::new(),
                indexes: BTreeMap::new(),
                users: BTreeMap::new(),
                roles: ["admin", "read-write"].into_iter().map(String::from).collect(),
                records: BTreeMap::new(),
                require_auth: false,
                accept_any_host: false,
                requests: Vec::new(),
                open_clients: 0,
            })),
        }
    }

    /// A single node on `127.0.0.1:5000` that answers on any address,
    /// with an `admin` user.
    pub fn standalone() -> Self {
        let cluster = Self::new();
        cluster.add_node(1, "127.0.0.1", 5000);
        cluster.accept_any_host(true);
        cluster.add_user("admin", "admin", &["admin"]);
        cluster
    }

    /// Adds a reachable node that sees, and is seen by, every existing node.
    pub fn add_node(&self, id: u64, address: &str, port: u16) -> NodeId {
        let id = NodeId(id);
        let mut state = self.state.lock();
        let mut sees: BTreeSet<NodeId> = state.nodes.keys().copied().collect();
        sees.insert(id);
        for node in state.nodes.values_mut() {
            node.sees.insert(id);
        }
        state.nodes.insert(
            id,
            NodeState {
                endpoint: ServerEndpoint::new(address, port),
                listeners: BTreeMap::new(),
                sees,
                reachable: true,
                in_cluster: true,
                version: "1.0.0".to_string(),
                roles: vec![NodeRole::IndexQuery, NodeRole::IndexUpdate],
                failing: BTreeSet::new(),
            },
        );
        id
    }

    /// Advertises an extra endpoint on `node` under `listener_name`.
    pub fn set_listener(&self, node: u64, listener_name: &str, address: &str, port: u16) {
        if let Some(state) = self.state.lock().nodes.get_mut(&NodeId(node)) {
            state
                .listeners
                .insert(listener_name.to_string(), ServerEndpoint::new(address, port));
        }
    }

    /// Removes `hidden` from the endpoints `observer` reports.
    pub fn hide(&self, observer: u64, hidden: u64) {
        if let Some(node) = self.state.lock().nodes.get_mut(&NodeId(observer)) {
            node.sees.remove(&NodeId(hidden));
        }
    }

    /// Controls whether clients can open a connection to `node`.
    pub fn set_reachable(&self, node: u64, reachable: bool) {
        if let Some(state) = self.state.lock().nodes.get_mut(&NodeId(node)) {
            state.reachable = reachable;
        }
    }

    /// Makes `node` fail every request for `fact`.
    pub fn fail(&self, node: u64, fact: Fact) {
        if let Some(state) = self.state.lock().nodes.get_mut(&NodeId(node)) {
            state.failing.insert(fact);
        }
    }

    pub fn set_version(&self, node: u64, version: &str) {
        if let Some(state) = self.state.lock().nodes.get_mut(&NodeId(node)) {
            state.version = version.to_string();
        }
    }

    /// When set, addresses that match no node resolve to the first node.
    pub fn accept_any_host(&self, accept: bool) {
        self.state.lock().accept_any_host = accept;
    }

    /// When set, connections must present valid credentials.
    pub fn require_auth(&self, required: bool) {
        self.state.lock().require_auth = required;
    }

    pub fn add_role(&self, role: &str) {
        self.state.lock().roles.insert(role.to_string());
    }

    pub fn add_user(&self, username: &str, password: &str, roles: &[&str]) {
        self.state.lock().users.insert(
            username.to_string(),
            StoredUser {
                password: password.to_string(),
                roles: roles.iter().map(|r| (*r).to_string()).collect(),
            },
        );
    }

    /// Current roles of `username`, if the user exists.
    pub fn user_roles(&self, username: &str) -> Option<Vec<String>> {
        self.state
            .lock()
            .users
            .get(username)
            .map(|user| user.roles.iter().cloned().collect())
    }

    /// Checks a password without going through a client.
    pub fn password_matches(&self, username: &str, password: &str) -> bool {
        self.state
            .lock()
            .users
            .get(username)
            .is_some_and(|user| user.password == password)
    }

    /// Stores an index without logging a request.
    pub fn add_index(&self, definition: IndexDefinition) {
        self.state.lock().indexes.insert(
            definition.id.clone(),
            StoredIndex {
                definition,
                status: None,
                last_gc: None,
            },
        );
    }

    /// The stored definition of an index.
    pub fn index(&self, namespace: &str, name: &str) -> Option<IndexDefinition> {
        self.state
            .lock()
            .indexes
            .get(&IndexId::new(namespace, name))
            .map(|stored| stored.definition.clone())
    }

    /// Overrides the status reported for an index.
    pub fn set_index_status(&self, namespace: &str, name: &str, status: IndexStatus) {
        if let Some(stored) = self
            .state
            .lock()
            .indexes
            .get_mut(&IndexId::new(namespace, name))
        {
            stored.status = Some(status);
        }
    }

    /// The cutoff of the last garbage collection run on an index.
    pub fn last_gc(&self, namespace: &str, name: &str) -> Option<DateTime<Utc>> {
        self.state
            .lock()
            .indexes
            .get(&IndexId::new(namespace, name))
            .and_then(|stored| stored.last_gc)
    }

    pub fn insert_record(&self, namespace: &str, set: Option<&str>, key: Key, record: Record) {
        self.state.lock().records.insert(
            RecordKey {
                namespace: namespace.to_string(),
                set: set.map(String::from),
                key,
            },
            record,
        );
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }

    /// Clients opened and not yet closed.
    pub fn open_clients(&self) -> usize {
        self.state.lock().open_clients
    }

    fn log(&self, request: Request) -> parking_lot::MutexGuard<'_, State> {
        let mut state = self.state.lock();
        tracing::trace!(?request, "memory cluster request");
        state.requests.push(request);
        state
    }
}

#[async_trait]
impl Connector for MemoryCluster {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn AdminClient>> {
        let mut state = self.log(Request::Connect {
            endpoint: options.endpoint.clone(),
            username: options.credentials.as_ref().map(|c| c.username.clone()),
        });

        if state.require_auth {
            let Some(credentials) = &options.credentials else {
                return Err(ClientError::status(
                    Code::Unauthenticated,
                    "authentication required",
                ));
            };
            let valid = state
                .users
                .get(&credentials.username)
                .is_some_and(|user| user.password == credentials.password);
            if !valid {
                return Err(ClientError::status(
                    Code::Unauthenticated,
                    "invalid username or password",
                ));
            }
        }

        let refused = |reason: &str| ClientError::Connect {
            endpoint: options.endpoint.to_string(),
            reason: reason.to_string(),
        };

        let (entry, members, load_balanced) = match &options.endpoint {
            Endpoint::LoadBalancer(host) => {
                let entry = state
                    .resolve_host(host)
                    .filter(|id| state.reachable(*id))
                    .ok_or_else(|| refused("connection refused"))?;
                (entry, Vec::new(), true)
            }
            Endpoint::Seeds(seeds) => {
                let reached: BTreeSet<NodeId> = seeds
                    .iter()
                    .filter_map(|seed| state.resolve_host(seed))
                    .filter(|id| state.reachable(*id))
                    .collect();
                let entry = *reached
                    .first()
                    .ok_or_else(|| refused("no seed could be reached"))?;
                let mut members = reached;
                if let Some(node) = state.nodes.get(&entry) {
                    members.extend(node.sees.iter().filter(|id| state.reachable(**id)));
                }
                (entry, members.into_iter().collect(), false)
            }
        };

        state.open_clients += 1;
        drop(state);

        tracing::debug!(%entry, members = members.len(), load_balanced, "memory client connected");
        Ok(Arc::new(MemoryClient {
            cluster: self.clone(),
            entry,
            members,
            load_balanced,
            listener_name: options.listener_name.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct MemoryClient {
    cluster: MemoryCluster,
    entry: NodeId,
    members: Vec<NodeId>,
    load_balanced: bool,
    listener_name: Option<String>,
    closed: AtomicBool,
}

impl MemoryClient {
    fn call(&self, request: Request) -> Result<parking_lot::MutexGuard<'_, State>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ClientError::Closed);
        }
        Ok(self.cluster.log(request))
    }

    fn target(&self, node: Option<NodeId>) -> Result<NodeId> {
        match node {
            None => Ok(self.entry),
            Some(id) if !self.load_balanced && self.members.contains(&id) => Ok(id),
            Some(id) => Err(ClientError::status(
                Code::Unavailable,
                format!("node {id} is not connected"),
            )),
        }
    }
}

#[async_trait]
impl AdminClient for MemoryClient {
    async fn index_create(&self, definition: &IndexDefinition) -> Result<()> {
        let mut state = self.call(Request::IndexCreate(definition.clone()))?;
        if definition.dimensions == 0 {
            return Err(ClientError::invalid_argument(
                "dimensions must be greater than 0",
            ));
        }
        if state.indexes.contains_key(&definition.id) {
            return Err(ClientError::status(
                Code::AlreadyExists,
                format!("index {} already exists", definition.id),
            ));
        }
        state.indexes.insert(
            definition.id.clone(),
            StoredIndex {
                definition: definition.clone(),
                status: None,
                last_gc: None,
            },
        );
        Ok(())
    }

    async fn index_update(
        &self,
        namespace: &str,
        name: &str,
        labels: Option<&Labels>,
        update: &HnswIndexUpdate,
    ) -> Result<()> {
        let id = IndexId::new(namespace, name);
        let mut state = self.call(Request::IndexUpdate {
            id: id.clone(),
            labels: labels.cloned(),
            update: update.clone(),
        })?;
        let stored = state
            .indexes
            .get_mut(&id)
            .ok_or_else(|| ClientError::not_found(format!("index {id} not found")))?;
        if let Some(labels) = labels {
            stored.definition.labels = labels.clone();
        }
        stored.definition.hnsw_params.apply(update);
        Ok(())
    }

    async fn index_drop(&self, namespace: &str, name: &str) -> Result<()> {
        let id = IndexId::new(namespace, name);
        let mut state = self.call(Request::IndexDrop(id.clone()))?;
        state
            .indexes
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ClientError::not_found(format!("index {id} not found")))
    }

    async fn index_list(&self) -> Result<Vec<IndexDefinition>> {
        let state = self.call(Request::IndexList)?;
        Ok(state
            .indexes
            .values()
            .map(|stored| stored.definition.clone())
            .collect())
    }

    async fn index_get(&self, namespace: &str, name: &str) -> Result<IndexDefinition> {
        let state = self.call(Request::IndexGet(IndexId::new(namespace, name)))?;
        Ok(state.index(namespace, name)?.definition.clone())
    }

    async fn index_status(&self, namespace: &str, name: &str) -> Result<IndexStatus> {
        let state = self.call(Request::IndexStatus(IndexId::new(namespace, name)))?;
        let stored = state.index(namespace, name)?;
        if let Some(status) = &stored.status {
            return Ok(status.clone());
        }
        let indexed = state.indexed_records(&stored.definition).count() as i64;
        Ok(IndexStatus {
            unmerged_record_count: 0,
            index_healer_vector_records_indexed: indexed,
            index_healer_vertices_valid: indexed,
            state: Default::default(),
        })
    }

    async fn gc_invalid_vertices(
        &self,
        namespace: &str,
        name: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<()> {
        let id = IndexId::new(namespace, name);
        let mut state = self.call(Request::GcInvalidVertices {
            id: id.clone(),
            cutoff,
        })?;
        let stored = state
            .indexes
            .get_mut(&id)
            .ok_or_else(|| ClientError::not_found(format!("index {id} not found")))?;
        stored.last_gc = Some(cutoff);
        Ok(())
    }

    async fn user_create(&self, username: &str, password: &str, roles: &[String]) -> Result<()> {
        let mut state = self.call(Request::UserCreate {
            username: username.to_string(),
            roles: roles.to_vec(),
        })?;
        if state.users.contains_key(username) {
            return Err(ClientError::status(
                Code::AlreadyExists,
                format!("user {username} already exists"),
            ));
        }
        state.check_roles(roles)?;
        state.users.insert(
            username.to_string(),
            StoredUser {
                password: password.to_string(),
                roles: roles.iter().cloned().collect(),
            },
        );
        Ok(())
    }

    async fn user_drop(&self, username: &str) -> Result<()> {
        let mut state = self.call(Request::UserDrop(username.to_string()))?;
        state
            .users
            .remove(username)
            .map(|_| ())
            .ok_or_else(|| ClientError::not_found(format!("user {username} not found")))
    }

    async fn user_update_credentials(&self, username: &str, password: &str) -> Result<()> {
        let mut state = self.call(Request::UserUpdateCredentials(username.to_string()))?;
        state.user(username)?.password = password.to_string();
        Ok(())
    }

    async fn user_grant_roles(&self, username: &str, roles: &[String]) -> Result<()> {
        let mut state = self.call(Request::UserGrantRoles {
            username: username.to_string(),
            roles: roles.to_vec(),
        })?;
        state.check_roles(roles)?;
        state.user(username)?.roles.extend(roles.iter().cloned());
        Ok(())
    }

    async fn user_revoke_roles(&self, username: &str, roles: &[String]) -> Result<()> {
        let mut state = self.call(Request::UserRevokeRoles {
            username: username.to_string(),
            roles: roles.to_vec(),
        })?;
        let user = state.user(username)?;
        for role in roles {
            user.roles.remove(role);
        }
        Ok(())
    }

    async fn user_list(&self) -> Result<Vec<User>> {
        let state = self.call(Request::UserList)?;
        Ok(state
            .users
            .iter()
            .map(|(name, user)| User {
                username: name.clone(),
                roles: user.roles.iter().cloned().collect(),
            })
            .collect())
    }

    async fn role_list(&self) -> Result<Vec<Role>> {
        let state = self.call(Request::RoleList)?;
        Ok(state.roles.iter().map(|id| Role { id: id.clone() }).collect())
    }

    async fn node_ids(&self) -> Result<Vec<NodeId>> {
        let _state = self.call(Request::NodeIds)?;
        Ok(self.members.clone())
    }

    async fn connected_node_endpoint(&self, node: Option<NodeId>) -> Result<ServerEndpoint> {
        let state = self.call(Request::ConnectedNodeEndpoint(node))?;
        let id = self.target(node)?;
        let node = state.fact(id, Fact::ConnectedEndpoint)?;
        Ok(node.endpoint_for(self.listener_name.as_deref()))
    }

    async fn cluster_endpoints(
        &self,
        node: Option<NodeId>,
        listener_name: Option<&str>,
    ) -> Result<ClusterEndpoints> {
        let state = self.call(Request::ClusterEndpoints {
            node,
            listener_name: listener_name.map(String::from),
        })?;
        let id = self.target(node)?;
        let observer = state.fact(id, Fact::ClusterEndpoints)?;
        Ok(observer
            .sees
            .iter()
            .filter_map(|peer| {
                state
                    .nodes
                    .get(peer)
                    .map(|peer_state| (*peer, vec![peer_state.endpoint_for(listener_name)]))
            })
            .collect())
    }

    async fn clustering_state(&self, node: Option<NodeId>) -> Result<ClusteringState> {
        let state = self.call(Request::ClusteringState(node))?;
        let id = self.target(node)?;
        let node = state.fact(id, Fact::ClusteringState)?;
        Ok(ClusteringState {
            is_in_cluster: node.in_cluster,
            cluster_id: state.cluster_id,
            members: node.sees.iter().copied().collect(),
        })
    }

    async fn about(&self, node: Option<NodeId>) -> Result<About> {
        let state = self.call(Request::About(node))?;
        let id = self.target(node)?;
        let node = state.fact(id, Fact::About)?;
        Ok(About {
            version: node.version.clone(),
            roles: node.roles.clone(),
        })
    }

    async fn get_record(
        &self,
        namespace: &str,
        set: Option<&str>,
        key: &Key,
        fields: Option<&[String]>,
    ) -> Result<Record> {
        let record_key = RecordKey {
            namespace: namespace.to_string(),
            set: set.map(String::from),
            key: key.clone(),
        };
        let state = self.call(Request::GetRecord {
            namespace: record_key.namespace.clone(),
            set: record_key.set.clone(),
            key: key.clone(),
        })?;
        let record = state
            .records
            .get(&record_key)
            .ok_or_else(|| ClientError::not_found("record not found"))?;
        Ok(Record {
            data: project_fields(&record.data, fields),
            ..record.clone()
        })
    }

    async fn vector_search(
        &self,
        namespace: &str,
        index_name: &str,
        query: &Vector,
        limit: u32,
        params: &SearchParams,
        include_fields: Option<&[String]>,
    ) -> Result<Vec<Neighbor>> {
        let state = self.call(Request::VectorSearch {
            namespace: namespace.to_string(),
            index_name: index_name.to_string(),
            query: query.clone(),
            limit,
            ef: params.ef,
            include_fields: include_fields.map(<[String]>::to_vec),
        })?;
        let definition = &state.index(namespace, index_name)?.definition;
        if query.len() != definition.dimensions as usize {
            return Err(ClientError::invalid_argument(format!(
                "query vector has {} dimensions, index {} expects {}",
                query.len(),
                definition.id,
                definition.dimensions
            )));
        }

        let mut hits: Vec<(f32, &RecordKey, &Record)> = state
            .indexed_records(definition)
            .filter_map(|(key, record, stored)| {
                distance(definition.distance_metric, query, &stored).map(|d| (d, key, record))
            })
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

        Ok(hits
            .into_iter()
            .take(limit as usize)
            .map(|(distance, key, record)| Neighbor {
                namespace: key.namespace.clone(),
                set: key.set.clone(),
                key: key.key.clone(),
                distance,
                record: Record {
                    data: project_fields(&record.data, include_fields),
                    ..record.clone()
                },
            })
            .collect())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            let mut state = self.cluster.state.lock();
            state.open_clients = state.open_clients.saturating_sub(1);
        }
    }
}

/// Distance between two vectors of the same element type.
fn distance(metric: DistanceMetric, a: &Vector, b: &Vector) -> Option<f32> {
    let as_floats = |bits: &[bool]| -> Vec<f32> {
        bits.iter().map(|&bit| if bit { 1.0 } else { 0.0 }).collect()
    };
    match (a, b) {
        (Vector::Float(a), Vector::Float(b)) => Some(float_distance(metric, a, b)),
        (Vector::Bool(a), Vector::Bool(b)) => {
            Some(float_distance(metric, &as_floats(a), &as_floats(b)))
        }
        _ => None,
    }
}

fn float_distance(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    let pairs = a.iter().zip(b);
    match metric {
        DistanceMetric::SquaredEuclidean => pairs.map(|(x, y)| (x - y) * (x - y)).sum(),
        DistanceMetric::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
        DistanceMetric::Hamming => pairs.filter(|(x, y)| x != y).count() as f32,
        DistanceMetric::DotProduct => 1.0 - pairs.map(|(x, y)| x * y).sum::<f32>(),
        DistanceMetric::Cosine => {
            let dot: f32 = pairs.map(|(x, y)| x * y).sum();
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                1.0
            } else {
                1.0 - dot / (norm_a * norm_b)
            }
        }
    }
}
