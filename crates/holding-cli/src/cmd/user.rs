use anyhow::{bail, Result};
use clap::Subcommand;
use holding_core::types::{ClientType, Role};
use holding_core::user::User;
use holding_core::{project, HoldingError};
use std::path::Path;

use crate::output::{print_json, Table};

// ---------------------------------------------------------------------------
// Subcommand definition
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug)]
pub enum UserSubcommand {
    /// Create a user; without --password a provisional one is generated
    Create {
        name: String,
        email: String,
        /// client, consultant, auxiliary or administrator
        #[arg(long, default_value = "client")]
        role: Role,
        /// partner or interested (clients only)
        #[arg(long)]
        client_type: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },
    /// List all users
    List,
    /// Show one user
    Show { id: String },
    /// Delete a user (refused while still a project member)
    Delete { id: String },
    /// Issue a new provisional password
    ResetPassword { id: String },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcommand: UserSubcommand, json: bool) -> Result<()> {
    match subcommand {
        UserSubcommand::Create {
            name,
            email,
            role,
            client_type,
            password,
        } => run_create(root, &name, &email, role, client_type.as_deref(), password.as_deref()),
        UserSubcommand::List => run_list(root, json),
        UserSubcommand::Show { id } => run_show(root, &id, json),
        UserSubcommand::Delete { id } => run_delete(root, &id),
        UserSubcommand::ResetPassword { id } => run_reset_password(root, &id),
    }
}

fn run_create(
    root: &Path,
    name: &str,
    email: &str,
    role: Role,
    client_type: Option<&str>,
    password: Option<&str>,
) -> Result<()> {
    let mut user = User::new(name, email, role, password.unwrap_or_default())?;

    if let Some(kind) = client_type {
        if role != Role::Client {
            bail!("--client-type only applies to the client role");
        }
        let kind = match kind {
            "partner" => ClientType::Partner,
            "interested" => ClientType::Interested,
            other => bail!("unknown client type: {other}"),
        };
        user.set_client_type(kind);
    }

    let provisional = if password.is_none() {
        Some(user.assign_provisional_password())
    } else {
        None
    };

    let user = User::create(root, user)?;
    println!("created user {} ({})", user.id, user.email);
    if let Some(provisional) = provisional {
        println!("provisional password: {provisional}");
    }
    Ok(())
}

fn run_list(root: &Path, json: bool) -> Result<()> {
    let users = User::list(root)?;
    if json {
        let views: Vec<serde_json::Value> = users.iter().map(user_view).collect();
        return print_json(&views);
    }

    let mut table = Table::new()
        .column("ID")
        .column("NAME")
        .column("EMAIL")
        .column("ROLE")
        .column("TYPE");
    for u in &users {
        table.row(vec![
            u.id.clone(),
            u.name.clone(),
            u.email.clone(),
            u.role.to_string(),
            u.client_type.map(|c| c.to_string()).unwrap_or_default(),
        ]);
    }
    table.print();
    Ok(())
}

fn run_show(root: &Path, id: &str, json: bool) -> Result<()> {
    let user = User::load(root, id)?;
    if json {
        return print_json(&user_view(&user));
    }

    println!("{} <{}>", user.name, user.email);
    println!("  id:            {}", user.id);
    println!("  role:          {}", user.role);
    if let Some(kind) = user.client_type {
        println!("  client type:   {kind}");
        println!("  data complete: {}", user.is_data_complete());
    }
    println!("  documents:     {}", user.documents.len());
    Ok(())
}

fn run_delete(root: &Path, id: &str) -> Result<()> {
    for project in project::list(root)? {
        if project.is_member(id) {
            return Err(HoldingError::UserReferenced {
                user: id.to_string(),
                project: project.id,
            }
            .into());
        }
    }
    User::delete(root, id)?;
    println!("deleted user {id}");
    Ok(())
}

fn run_reset_password(root: &Path, id: &str) -> Result<()> {
    let mut user = User::load(root, id)?;
    let provisional = user.assign_provisional_password();
    user.save(root)?;
    println!("provisional password for {}: {provisional}", user.email);
    Ok(())
}

fn user_view(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
        "role": user.role,
        "client_type": user.client_type,
        "data_complete": user.is_data_complete(),
        "documents": user.documents.len(),
    })
}
