use alms_core::entities::{Credentials, Registration};
use alms_store::Stores;
use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuthCommands;
use crate::output::output;

pub async fn handle(action: AuthCommands, stores: &Stores, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        AuthCommands::Login(args) => {
            let credentials = Credentials {
                email: args.email,
                password: password(args.password)?,
            };
            stores.auth.login(&credentials).await.context("login failed")?;
        }
        AuthCommands::Register(args) => {
            let registration = Registration {
                name: args.name,
                email: args.email,
                password: password(args.password)?,
                role: args.role.into(),
                phone: args.phone,
                organization_name: args.organization,
            };
            stores
                .auth
                .register(&registration)
                .await
                .context("registration failed")?;
        }
        AuthCommands::Logout => stores.auth.logout().await,
        AuthCommands::Status => {}
    }
    output(&stores.auth.state(), flags.format)
}

fn password(explicit: Option<String>) -> anyhow::Result<String> {
    explicit
        .or_else(|| std::env::var("ALMS_PASSWORD").ok())
        .filter(|password| !password.is_empty())
        .context("no password given; pass --password or set ALMS_PASSWORD")
}
