//! Role commands.

use super::Session;
use crate::bootstrap::Deadline;
use crate::cli::{ListArgs, RoleCommand};
use crate::error::Result;
use crate::flags::ClientArgs;
use crate::output::{Render, RoleWriter};
use crate::view::View;

/// Run role commands.
pub async fn run(session: &mut Session<'_>, client_args: &ClientArgs, cmd: RoleCommand) -> Result<()> {
    let RoleCommand::Ls(args) = cmd;
    list(session, client_args, args).await
}

async fn list(session: &mut Session<'_>, client_args: &ClientArgs, args: ListArgs) -> Result<()> {
    tracing::debug!(?args, "role ls");
    let config = session.resolve(client_args)?;
    let client = session.connect(&config).await?;
    let watch = session.watch();
    let color = session.view.color();

    let result = watch
        .run(&mut session.view, &args.watch, async |view: &mut View| {
            let deadline = Deadline::after(config.timeout);
            let roles = deadline.run("Unable to list roles", client.role_list()).await?;
            let mut writer = RoleWriter::new(color);
            for role in &roles {
                writer.append(role);
            }
            view.print(writer.render(args.format.mode()));
            Ok(())
        })
        .await;
    client.close().await;
    result
}
