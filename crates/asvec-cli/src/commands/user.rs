//! User management commands.

use super::{Session, require};
use crate::bootstrap::Deadline;
use crate::cli::{ListArgs, UserCommand, UserCreateArgs, UserDropArgs, UserNewPasswordArgs, UserRolesArgs};
use crate::error::Result;
use crate::flags::ClientArgs;
use crate::output::{Render, UserWriter};
use crate::prompt;
use crate::view::View;

/// Run user commands.
pub async fn run(session: &mut Session<'_>, client: &ClientArgs, cmd: UserCommand) -> Result<()> {
    match cmd {
        UserCommand::Create(args) => create(session, client, args).await,
        UserCommand::Drop(args) => drop_user(session, client, args).await,
        UserCommand::Grant(args) => grant(session, client, args).await,
        UserCommand::Revoke(args) => revoke(session, client, args).await,
        UserCommand::Ls(args) => list(session, client, args).await,
        UserCommand::NewPassword(args) => new_password(session, client, args).await,
    }
}

/// The given password, or one read from the prompt.
fn password_or_prompt(session: &mut Session<'_>, given: Option<String>, prompt_text: &str) -> Result<String> {
    match given {
        Some(password) => Ok(password),
        None => prompt::password(&mut session.view, &mut session.input, prompt_text),
    }
}

async fn create(session: &mut Session<'_>, client_args: &ClientArgs, args: UserCreateArgs) -> Result<()> {
    tracing::debug!(
        name = ?args.name,
        new_password = ?args.new_password.as_ref().map(|_| "*"),
        roles = ?args.roles,
        "user create"
    );
    require(&[("name", args.name.is_some()), ("roles", !args.roles.is_empty())])?;
    let config = session.resolve(client_args)?;
    let name = args.name.unwrap_or_default();
    let password = password_or_prompt(session, args.new_password, "New User Password: ")?;

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let result = deadline
        .run("Unable to create user", client.user_create(&name, &password, &args.roles))
        .await;
    client.close().await;
    result?;

    session.view.print(format!("Successfully created user {name}"));
    Ok(())
}

async fn drop_user(session: &mut Session<'_>, client_args: &ClientArgs, args: UserDropArgs) -> Result<()> {
    tracing::debug!(?args, "user drop");
    require(&[("name", args.name.is_some())])?;
    let config = session.resolve(client_args)?;
    let name = args.name.unwrap_or_default();

    let question = format!("Are you sure you want to drop the user {name}?");
    if !session.confirm(args.yes, &question)? {
        return Ok(());
    }

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let result = deadline
        .run("Unable to drop user", client.user_drop(&name))
        .await;
    client.close().await;
    result?;

    session.view.print(format!("Successfully dropped user {name}"));
    Ok(())
}

async fn grant(session: &mut Session<'_>, client_args: &ClientArgs, args: UserRolesArgs) -> Result<()> {
    tracing::debug!(?args, "user grant");
    require(&[("name", args.name.is_some()), ("roles", !args.roles.is_empty())])?;
    let config = session.resolve(client_args)?;
    let name = args.name.unwrap_or_default();

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let result = deadline
        .run("Unable to grant user roles", client.user_grant_roles(&name, &args.roles))
        .await;
    client.close().await;
    result?;

    session.view.print(format!(
        "Successfully granted user {name} roles {}",
        args.roles.join(", ")
    ));
    Ok(())
}

async fn revoke(session: &mut Session<'_>, client_args: &ClientArgs, args: UserRolesArgs) -> Result<()> {
    tracing::debug!(?args, "user revoke");
    require(&[("name", args.name.is_some()), ("roles", !args.roles.is_empty())])?;
    let config = session.resolve(client_args)?;
    let name = args.name.unwrap_or_default();

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let result = deadline
        .run("Unable to revoke user roles", client.user_revoke_roles(&name, &args.roles))
        .await;
    client.close().await;
    result?;

    session.view.print(format!(
        "Successfully revoked user {name}'s roles {}",
        args.roles.join(", ")
    ));
    Ok(())
}

async fn new_password(
    session: &mut Session<'_>,
    client_args: &ClientArgs,
    args: UserNewPasswordArgs,
) -> Result<()> {
    tracing::debug!(
        name = ?args.name,
        new_password = ?args.new_password.as_ref().map(|_| "*"),
        "user new-password"
    );
    require(&[("name", args.name.is_some())])?;
    let config = session.resolve(client_args)?;
    let name = args.name.unwrap_or_default();
    let password = password_or_prompt(session, args.new_password, "New Password: ")?;

    let client = session.connect(&config).await?;
    let deadline = Deadline::after(config.timeout);
    let result = deadline
        .run(
            "Unable to update user credentials",
            client.user_update_credentials(&name, &password),
        )
        .await;
    client.close().await;
    result?;

    session
        .view
        .print(format!("Successfully updated user {name}'s credentials"));
    Ok(())
}

async fn list(session: &mut Session<'_>, client_args: &ClientArgs, args: ListArgs) -> Result<()> {
    tracing::debug!(?args, "user ls");
    let config = session.resolve(client_args)?;
    let client = session.connect(&config).await?;
    let watch = session.watch();
    let color = session.view.color();

    let result = watch
        .run(&mut session.view, &args.watch, async |view: &mut View| {
            let deadline = Deadline::after(config.timeout);
            let users = deadline.run("Unable to list users", client.user_list()).await?;
            let mut writer = UserWriter::new(color);
            for user in &users {
                writer.append(user);
            }
            view.print(writer.render(args.format.mode()));
            Ok(())
        })
        .await;
    client.close().await;
    result
}
