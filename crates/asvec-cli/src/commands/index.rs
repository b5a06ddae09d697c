//! Index management commands.

use std::path::Path;
use std::sync::Arc;

use asvec_client::{
    AdminClient, IndexDefinition, IndexId, IndexStatus, IndexStorage, Labels,
};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{Session, require};
use crate::bootstrap::Deadline;
use crate::cli::{
    IndexCommand, IndexCreateArgs, IndexDropArgs, IndexGcArgs, IndexLsArgs, IndexUpdateArgs,
};
use crate::error::{CliError, Result};
use crate::flags::ClientArgs;
use crate::output::{IndexWriter, Render, yaml};
use crate::view::View;

/// Index status requests in flight at once during `index ls`.
const STATUS_CONCURRENCY: usize = 16;

/// Run index commands.
pub async fn run(session: &mut Session<'_>, client: &ClientArgs, cmd: IndexCommand) -> Result<()> {
    match cmd {
        IndexCommand::Create(args) => create(session, client, args).await,
        IndexCommand::Update(args) => update(session, client, args).await,
        IndexCommand::Drop(args) => drop_index(session, client, args).await,
        IndexCommand::Gc(args) => gc(session, client, args).await,
        IndexCommand::Ls(args) => list(session, client, args).await,
    }
}

async fn create(session: &mut Session<'_>, client_args: &ClientArgs, args: IndexCreateArgs) -> Result<()> {
    tracing::debug!(?args, "index create");
    if let Some(path) = &args.file {
        return create_from_file(session, client_args, path, args.yes).await;
    }

    let [namespace, index_name] = args.id.presence();
    require(&[
        namespace,
        index_name,
        ("vector-field", args.vector_field.is_some()),
        ("dimension", args.dimension.is_some()),
        ("distance-metric", args.distance_metric.is_some()),
    ])?;
    let definition = definition_from_flags(&args)?;
    validate(&definition).map_err(CliError::Arg)?;
    let config = session.resolve(client_args)?;

    let question = format!("Are you sure you want to create the index {}?", definition.id);
    if !session.confirm(args.yes, &question)? {
        return Ok(());
    }

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let result = deadline
        .run("Unable to create index", client.index_create(&definition))
        .await;
    client.close().await;
    result?;

    session
        .view
        .print(format!("Successfully created index {}", definition.id));
    Ok(())
}

/// Creates every index in `path`, continuing past failures.
async fn create_from_file(
    session: &mut Session<'_>,
    client_args: &ClientArgs,
    path: &Path,
    yes: bool,
) -> Result<()> {
    let definitions = yaml::load(path)?;
    let config = session.resolve(client_args)?;

    let question = format!(
        "Are you sure you want to create {} index(es) from {}?",
        definitions.len(),
        path.display()
    );
    if !session.confirm(yes, &question)? {
        return Ok(());
    }

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let total = definitions.len();
    let mut created = 0;
    for definition in &definitions {
        let outcome = match validate(definition) {
            Err(reason) => Err(reason),
            Ok(()) => deadline
                .call(client.index_create(definition))
                .await
                .map_err(|failure| {
                    tracing::error!(index = %definition.id, error = %failure, "failed to create index");
                    failure.to_string()
                }),
        };
        match outcome {
            Ok(()) => {
                created += 1;
                session
                    .view
                    .print(format!("Successfully created index {}", definition.id));
            }
            Err(reason) => session
                .view
                .error(format!("Failed to create index {}: {reason}", definition.id)),
        }
    }
    client.close().await;

    session
        .view
        .print(format!("Created {created} of {total} indexes"));
    if created < total {
        return Err(CliError::PartialFailure {
            failed: total - created,
            total,
        });
    }
    Ok(())
}

fn definition_from_flags(args: &IndexCreateArgs) -> Result<IndexDefinition> {
    let (Some(field), Some(dimensions), Some(metric)) =
        (&args.vector_field, args.dimension, args.distance_metric)
    else {
        return Err(CliError::Arg("incomplete index definition".to_string()));
    };

    let mut definition = IndexDefinition::new(
        IndexId::new(args.id.namespace(), args.id.name()),
        field.as_str(),
        dimensions,
        metric,
    );
    definition.set_filter = args.set_filter.clone();
    definition.labels = args.labels.iter().cloned().collect();
    let storage = IndexStorage {
        namespace: args.storage_namespace.clone(),
        set: args.storage_set.clone(),
    };
    definition.storage = (!storage.is_empty()).then_some(storage);
    definition.hnsw_params = args.tuning.params(&args.graph);
    Ok(definition)
}

/// Checks a definition can be sent.
fn validate(definition: &IndexDefinition) -> std::result::Result<(), String> {
    if definition.dimensions == 0 {
        return Err("dimension must be greater than 0".to_string());
    }
    Ok(())
}

async fn update(session: &mut Session<'_>, client_args: &ClientArgs, args: IndexUpdateArgs) -> Result<()> {
    tracing::debug!(?args, "index update");
    require(&args.id.presence())?;
    let config = session.resolve(client_args)?;
    let id = IndexId::new(args.id.namespace(), args.id.name());
    let labels: Option<Labels> = args
        .labels
        .as_ref()
        .map(|pairs| pairs.iter().cloned().collect());
    let hnsw = args.tuning.update();
    if labels.is_none() && hnsw.is_empty() {
        tracing::warn!(index = %id, "no index fields given to update");
    }

    let question = format!("Are you sure you want to update the index {id}?");
    if !session.confirm(args.yes, &question)? {
        return Ok(());
    }

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let result = deadline
        .run(
            "Unable to update index",
            client.index_update(&id.namespace, &id.name, labels.as_ref(), &hnsw),
        )
        .await;
    client.close().await;
    result?;

    session.view.print(format!("Successfully updated index {id}"));
    Ok(())
}

async fn drop_index(session: &mut Session<'_>, client_args: &ClientArgs, args: IndexDropArgs) -> Result<()> {
    tracing::debug!(?args, "index drop");
    require(&args.id.presence())?;
    let config = session.resolve(client_args)?;
    let id = IndexId::new(args.id.namespace(), args.id.name());

    let question = format!("Are you sure you want to drop the index {id}?");
    if !session.confirm(args.yes, &question)? {
        return Ok(());
    }

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let result = deadline
        .run("Unable to drop index", client.index_drop(&id.namespace, &id.name))
        .await;
    client.close().await;
    result?;

    session.view.print(format!("Successfully dropped index {id}"));
    Ok(())
}

async fn gc(session: &mut Session<'_>, client_args: &ClientArgs, args: IndexGcArgs) -> Result<()> {
    tracing::debug!(?args, "index gc");
    let [namespace, index_name] = args.id.presence();
    require(&[namespace, index_name, ("cutoff-time", args.cutoff_time.is_some())])?;
    let config = session.resolve(client_args)?;
    let id = IndexId::new(args.id.namespace(), args.id.name());
    let cutoff = args.cutoff_time.map(|t| t.time()).unwrap_or_default();

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let result = deadline
        .run(
            "Unable to garbage collect index",
            client.gc_invalid_vertices(&id.namespace, &id.name, cutoff),
        )
        .await;
    client.close().await;
    result?;

    session
        .view
        .print(format!("Successfully started garbage collection for index {id}"));
    Ok(())
}

async fn list(session: &mut Session<'_>, client_args: &ClientArgs, args: IndexLsArgs) -> Result<()> {
    tracing::debug!(?args, "index ls");
    let config = session.resolve(client_args)?;
    let client = session.connect(&config).await?;
    let watch = session.watch();
    let color = session.view.color();

    let result = watch
        .run(&mut session.view, &args.watch, async |view: &mut View| {
            let deadline = Deadline::after(config.timeout);
            let definitions = deadline
                .run("Unable to list indexes", client.index_list())
                .await?;
            if args.yaml {
                view.write_raw(&yaml::to_yaml(&definitions)?);
                return Ok(());
            }

            let statuses = fetch_statuses(&client, deadline, &definitions).await;
            let mut writer = IndexWriter::new(args.verbose, color);
            for (definition, status) in definitions.iter().zip(&statuses) {
                writer.append(definition, status.as_ref());
            }
            view.print(writer.render(args.format.mode()));
            Ok(())
        })
        .await;
    client.close().await;
    result
}

/// Fetches every index status concurrently. Failures are logged and leave
/// that index's status unknown.
async fn fetch_statuses(
    client: &Arc<dyn AdminClient>,
    deadline: Deadline,
    definitions: &[IndexDefinition],
) -> Vec<Option<IndexStatus>> {
    let permits = Arc::new(Semaphore::new(STATUS_CONCURRENCY));
    let mut tasks = JoinSet::new();
    for (slot, definition) in definitions.iter().enumerate() {
        let client = Arc::clone(client);
        let permits = Arc::clone(&permits);
        let id = definition.id.clone();
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let status = deadline
                .call(client.index_status(&id.namespace, &id.name))
                .await;
            (slot, id, status)
        });
    }

    let mut statuses = vec![None; definitions.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, _, Ok(status))) => statuses[slot] = Some(status),
            Ok((_, id, Err(error))) => {
                tracing::error!(index = %id, %error, "failed to get index status");
            }
            Err(error) => tracing::error!(%error, "index status task failed"),
        }
    }
    statuses
}

#[cfg(test)]
mod tests {
    use super::*;
    use asvec_client::DistanceMetric;
    use asvec_client::memory::MemoryCluster;
    use asvec_client::{ConnectOptions, Connector, Endpoint, HostPort};
    use std::time::Duration;

    use crate::cli::IndexIdArgs;

    fn create_args() -> IndexCreateArgs {
        IndexCreateArgs {
            id: IndexIdArgs {
                namespace: Some("test".to_string()),
                index_name: Some("idx".to_string()),
            },
            vector_field: Some("v".to_string()),
            dimension: Some(3),
            distance_metric: Some(DistanceMetric::Cosine),
            ..IndexCreateArgs::default()
        }
    }

    #[test]
    fn test_definition_defaults_leave_storage_unset() {
        let definition = definition_from_flags(&create_args()).unwrap();
        assert_eq!(definition.id, IndexId::new("test", "idx"));
        assert!(definition.storage.is_none());
        assert!(definition.hnsw_params.is_empty());
    }

    #[test]
    fn test_definition_carries_storage_and_labels() {
        let args = IndexCreateArgs {
            storage_set: Some("graph".to_string()),
            labels: vec![("model".to_string(), "a".to_string())],
            ..create_args()
        };
        let definition = definition_from_flags(&args).unwrap();
        let storage = definition.storage.unwrap();
        assert_eq!(storage.set.as_deref(), Some("graph"));
        assert_eq!(storage.namespace, None);
        assert_eq!(definition.labels.get("model").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let args = IndexCreateArgs {
            dimension: Some(0),
            ..create_args()
        };
        let definition = definition_from_flags(&args).unwrap();
        assert!(validate(&definition).is_err());
    }

    #[tokio::test]
    async fn test_status_failures_are_unknown() {
        let cluster = MemoryCluster::standalone();
        let present = IndexDefinition::new(IndexId::new("test", "a"), "v", 2, DistanceMetric::Cosine);
        cluster.add_index(present.clone());
        let missing = IndexDefinition::new(IndexId::new("test", "gone"), "v", 2, DistanceMetric::Cosine);

        let options = ConnectOptions::new(Endpoint::LoadBalancer(HostPort::new("127.0.0.1", 5000)));
        let client = cluster.connect(&options).await.unwrap();
        let statuses = fetch_statuses(
            &client,
            Deadline::after(Duration::from_secs(5)),
            &[present, missing],
        )
        .await;

        assert!(statuses[0].is_some());
        assert!(statuses[1].is_none());
    }
}
