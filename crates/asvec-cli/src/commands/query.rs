//! The `query` command.
//!
//! The probe vector comes from `--vector`, else from the vector field of
//! the record named by `--key-str`/`--key-int`, else a zero vector of the
//! index dimension. A zero probe is tried as floats first and as booleans
//! when that finds nothing, since the index element type is not known.

use std::sync::Arc;

use asvec_client::{AdminClient, Code, IndexDefinition, Key, Neighbor, SearchParams, Value, Vector};

use super::{Session, require};
use crate::bootstrap::{Deadline, Failure};
use crate::cli::QueryArgs;
use crate::error::Result;
use crate::flags::ClientArgs;
use crate::interactive::{self, QueryBrowser};
use crate::output::{DataLimits, NeighborWriter, Render, RenderMode};
use crate::view::View;

const DEFAULT_MAX_RESULTS: u32 = 5;
const DEFAULT_MAX_KEYS: usize = 5;
const DEFAULT_MAX_WIDTH: usize = 50;

/// Where the query vector comes from.
#[derive(Debug, Clone, PartialEq)]
enum Probe {
    Vector(Vector),
    Key(Key),
    Zero,
}

impl Probe {
    fn from_args(args: &QueryArgs) -> Self {
        if let Some(vector) = &args.vector {
            Self::Vector(vector.clone())
        } else if let Some(key) = &args.key_str {
            Self::Key(Key::from(key.as_str()))
        } else if let Some(key) = args.key_int {
            Self::Key(Key::from(key))
        } else {
            Self::Zero
        }
    }
}

/// Run the query command.
pub async fn run(session: &mut Session<'_>, client_args: &ClientArgs, args: QueryArgs) -> Result<()> {
    tracing::debug!(?args, "query");
    require(&args.id.presence())?;
    let config = session.resolve(client_args)?;
    let probe = Probe::from_args(&args);
    if args.set.is_some() && !matches!(probe, Probe::Key(_)) {
        session
            .view
            .warning("The --set flag is only used when the --key-str or --key-int flag is set.");
    }

    let client = session.connect(&config).await?;
    let result = if args.interactive {
        browse(session, &client, config.timeout, &args, probe).await
    } else {
        let watch = session.watch();
        let color = session.view.color();
        watch
            .run(&mut session.view, &args.watch, async |view: &mut View| {
                let search = Search {
                    client: client.as_ref(),
                    args: &args,
                    deadline: Deadline::after(config.timeout),
                };
                let definition = search.definition().await?;
                let neighbors = search.neighbors(view, &definition, &probe).await?;
                render(view, &args, &neighbors, color);
                Ok(())
            })
            .await
    };
    client.close().await;
    result
}

/// The interactive loop: show results, and search again from the record
/// the user picked until they leave without picking one.
async fn browse(
    session: &mut Session<'_>,
    client: &Arc<dyn AdminClient>,
    timeout: std::time::Duration,
    args: &QueryArgs,
    mut probe: Probe,
) -> Result<()> {
    loop {
        let search = Search {
            client: client.as_ref(),
            args,
            deadline: Deadline::after(timeout),
        };
        let definition = search.definition().await?;
        let neighbors = search.neighbors(&mut session.view, &definition, &probe).await?;
        if neighbors.is_empty() {
            session.view.warning("Query returned zero results.");
            return Ok(());
        }

        let browser = QueryBrowser::new(neighbors, data_limits(args));
        let browser = tokio::task::spawn_blocking(move || interactive::browse(browser))
            .await
            .map_err(anyhow::Error::from)??;
        let Some(selected) = browser.selected_for_requery() else {
            return Ok(());
        };

        match selected.record.data.get(&definition.field).and_then(Value::as_vector) {
            Some(vector) => {
                tracing::debug!(key = %selected.key, "querying from selected record");
                probe = Probe::Vector(vector);
            }
            None => {
                session.view.warning(format!(
                    "The selected record has no vector in field {}.",
                    definition.field
                ));
                return Ok(());
            }
        }
    }
}

fn render(view: &mut View, args: &QueryArgs, neighbors: &[Neighbor], color: bool) {
    if neighbors.is_empty() {
        view.warning("Query returned zero results.");
        return;
    }
    let mode = args.format.mode();
    let mut writer = NeighborWriter::new(data_limits(args), color);
    writer.append_all(neighbors);
    view.print(writer.render(mode));

    if mode == RenderMode::Table {
        if args.max_results.is_none() {
            view.print("Hint: To increase the number of results returned, use --max-results.");
        }
        if args.fields.is_none() {
            view.print("Hint: To choose which record data fields are displayed, use --fields.");
        }
    }
}

fn data_limits(args: &QueryArgs) -> DataLimits {
    let max_keys = match (args.max_keys, &args.fields) {
        (Some(keys), _) => Some(keys as usize),
        (None, Some(_)) => None,
        (None, None) => Some(DEFAULT_MAX_KEYS),
    };
    DataLimits {
        max_keys,
        max_width: args.max_width.map_or(DEFAULT_MAX_WIDTH, |w| w as usize),
    }
}

/// One search, bound to a client and a deadline.
struct Search<'a> {
    client: &'a dyn AdminClient,
    args: &'a QueryArgs,
    deadline: Deadline,
}

impl Search<'_> {
    fn namespace(&self) -> &str {
        self.args.id.namespace()
    }

    fn index(&self) -> &str {
        self.args.id.name()
    }

    fn limit(&self) -> u32 {
        self.args.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
    }

    async fn definition(&self) -> Result<IndexDefinition> {
        self.deadline
            .run(
                "Failed to get index definition",
                self.client.index_get(self.namespace(), self.index()),
            )
            .await
    }

    async fn neighbors(&self, view: &mut View, definition: &IndexDefinition, probe: &Probe) -> Result<Vec<Neighbor>> {
        match probe {
            Probe::Vector(vector) => self.search(vector, self.limit()).await,
            Probe::Key(key) => self.by_key(view, definition, key).await,
            Probe::Zero => self.by_zero(definition).await,
        }
    }

    async fn nearest(&self, vector: &Vector, limit: u32) -> std::result::Result<Vec<Neighbor>, Failure> {
        let params = SearchParams {
            ef: self.args.hnsw_ef,
        };
        self.deadline
            .call(self.client.vector_search(
                self.namespace(),
                self.index(),
                vector,
                limit,
                &params,
                self.args.fields.as_deref(),
            ))
            .await
    }

    async fn search(&self, vector: &Vector, limit: u32) -> Result<Vec<Neighbor>> {
        self.nearest(vector, limit)
            .await
            .map_err(|failure| self.fail("Failed to run vector search", failure))
    }

    /// Searches from the record's own vector and leaves the record out of
    /// the results.
    async fn by_key(&self, view: &mut View, definition: &IndexDefinition, key: &Key) -> Result<Vec<Neighbor>> {
        let set = self.args.set.as_deref().or(definition.set_filter.as_deref());
        if set.is_none() {
            view.warning("No set was given for the key and the index has no set filter. Looking up the record without a set.");
        }

        let record = match self
            .deadline
            .call(self.client.get_record(self.namespace(), set, key, None))
            .await
        {
            Ok(record) => record,
            Err(failure) if failure.is_not_found() => {
                view.warning("The requested record was not found. Defaulting to a zero vector.");
                return self.by_zero(definition).await;
            }
            Err(failure) => return Err(self.fail("Failed to get record", failure)),
        };

        let Some(vector) = record.data.get(&definition.field).and_then(Value::as_vector) else {
            view.warning(format!(
                "The requested record has no vector in field {}. Defaulting to a zero vector.",
                definition.field
            ));
            return self.by_zero(definition).await;
        };

        let limit = self.limit();
        let mut neighbors = self.search(&vector, limit.saturating_add(1)).await?;
        neighbors.retain(|n| !(n.key == *key && n.namespace == self.namespace() && n.set.as_deref() == set));
        neighbors.truncate(limit as usize);
        Ok(neighbors)
    }

    async fn by_zero(&self, definition: &IndexDefinition) -> Result<Vec<Neighbor>> {
        let dimensions = definition.dimensions as usize;
        match self.nearest(&Vector::zero_float(dimensions), self.limit()).await {
            Ok(neighbors) if !neighbors.is_empty() => return Ok(neighbors),
            Ok(_) => {}
            Err(Failure::Remote(e)) if e.code() == Some(Code::InvalidArgument) => {}
            Err(failure) => return Err(self.fail("Failed to run vector search", failure)),
        }
        tracing::warn!(
            index = self.index(),
            "zero float vector found nothing, retrying with a boolean vector"
        );
        self.search(&Vector::zero_bool(dimensions), self.limit()).await
    }

    fn fail(&self, action: &str, failure: Failure) -> crate::error::CliError {
        tracing::error!(action, error = %failure, "remote call failed");
        self.deadline.surface(action, failure)
    }
}
