//! Node commands.

use std::sync::Arc;

use super::Session;
use crate::bootstrap::Deadline;
use crate::cli::{ListArgs, NodeCommand};
use crate::error::Result;
use crate::flags::ClientArgs;
use crate::output::{NodeWriter, Render};
use crate::topology;
use crate::view::View;

/// Run node commands.
pub async fn run(session: &mut Session<'_>, client_args: &ClientArgs, cmd: NodeCommand) -> Result<()> {
    let NodeCommand::Ls(args) = cmd;
    list(session, client_args, args).await
}

async fn list(session: &mut Session<'_>, client_args: &ClientArgs, args: ListArgs) -> Result<()> {
    tracing::debug!(?args, "node ls");
    let config = session.resolve(client_args)?;
    let load_balanced = config.is_load_balancer();
    let client = session.connect(&config).await?;
    let watch = session.watch();
    let color = session.view.color();

    let result = watch
        .run(&mut session.view, &args.watch, async |view: &mut View| {
            let deadline = Deadline::after(config.timeout);
            let nodes = topology::gather(
                Arc::clone(&client),
                deadline,
                config.listener_name.clone(),
                load_balanced,
            )
            .await?;

            let mut writer = NodeWriter::new(color);
            for node in &nodes {
                writer.append(node);
            }
            view.print(writer.render(args.format.mode()));
            topology::warn(view, &topology::analyze(&nodes), load_balanced);
            Ok(())
        })
        .await;
    client.close().await;
    result
}
