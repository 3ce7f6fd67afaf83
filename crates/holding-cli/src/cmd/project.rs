use anyhow::{bail, Context, Result};
use clap::Subcommand;
use holding_core::project::{self, Actor, Project};
use holding_core::types::Role;
use holding_core::user::User;
use std::path::Path;

use crate::output::{print_json, Table};

// ---------------------------------------------------------------------------
// Subcommand definition
// ---------------------------------------------------------------------------

#[derive(Subcommand, Debug)]
pub enum ProjectSubcommand {
    /// Create a project with its ten phases
    Create {
        name: String,
        /// Consultant email
        #[arg(long)]
        consultant: String,
        /// Client email, repeatable; the first is the main client
        #[arg(long = "client", required = true)]
        clients: Vec<String>,
    },
    /// List projects, newest first
    List,
    /// Show one project and its phase statuses
    Show { id: String },
    /// Advance the pipeline from the given phase (consultant required)
    Advance {
        id: String,
        #[arg(long)]
        from_phase: u8,
        /// Email of the acting consultant or administrator
        #[arg(long)]
        actor: String,
    },
    /// Hard-delete a project
    Delete { id: String },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcommand: ProjectSubcommand, json: bool) -> Result<()> {
    match subcommand {
        ProjectSubcommand::Create {
            name,
            consultant,
            clients,
        } => run_create(root, &name, &consultant, &clients),
        ProjectSubcommand::List => run_list(root, json),
        ProjectSubcommand::Show { id } => run_show(root, &id, json),
        ProjectSubcommand::Advance {
            id,
            from_phase,
            actor,
        } => run_advance(root, &id, from_phase, &actor),
        ProjectSubcommand::Delete { id } => run_delete(root, &id),
    }
}

fn find_user(root: &Path, email: &str) -> Result<User> {
    User::find_by_email(root, email)?.with_context(|| format!("no user with email {email}"))
}

fn run_create(root: &Path, name: &str, consultant: &str, clients: &[String]) -> Result<()> {
    let consultant = find_user(root, consultant)?;
    if !consultant.role.is_staff() {
        bail!("{} is not a staff user", consultant.email);
    }

    let mut client_ids = Vec::new();
    for email in clients {
        let user = find_user(root, email)?;
        if user.role != Role::Client {
            bail!("{} is not a client user", user.email);
        }
        client_ids.push(user.id);
    }

    let mut p = Project::new(name, consultant.id.clone(), client_ids);
    let actor = Actor::from_user(&consultant);
    p.log(&actor, "criou o projeto");
    project::save(root, &p)?;

    println!("created project {} ({})", p.id, p.name);
    Ok(())
}

fn run_list(root: &Path, json: bool) -> Result<()> {
    let projects = project::list(root)?;
    if json {
        let views: Vec<serde_json::Value> = projects.iter().map(summary_view).collect();
        return print_json(&views);
    }

    let mut table = Table::new()
        .column("ID")
        .column("NAME")
        .column("STATUS")
        .numeric("PHASE")
        .numeric("CLIENTS");
    for p in &projects {
        table.row(vec![
            p.id.clone(),
            p.name.clone(),
            p.status.to_string(),
            format!("{}/10", p.current_phase),
            p.client_ids.len().to_string(),
        ]);
    }
    table.print();
    Ok(())
}

fn run_show(root: &Path, id: &str, json: bool) -> Result<()> {
    let p = project::load(root, id)?;
    if json {
        return print_json(&p);
    }

    println!("{} ({})", p.name, p.id);
    println!("  status:        {}", p.status);
    println!("  current phase: {}", p.current_phase);
    println!("  clients:       {}", p.client_ids.len());
    println!();
    let mut table = Table::new().numeric("#").column("PHASE").column("STATUS");
    for phase in &p.phases {
        table.row(vec![
            phase.id.number().to_string(),
            phase.id.title().to_string(),
            phase.status.to_string(),
        ]);
    }
    table.print();
    Ok(())
}

fn run_advance(root: &Path, id: &str, from_phase: u8, actor_email: &str) -> Result<()> {
    let user = find_user(root, actor_email)?;
    let actor = Actor::from_user(&user);

    let mut p = project::load(root, id)?;
    let advanced = p.advance_phase(from_phase, &actor)?;
    if advanced {
        p.log(&actor, format!("avançou para a fase {}", p.current_phase));
        project::save(root, &p)?;
        println!("advanced to phase {}", p.current_phase);
    } else {
        println!("already past phase {from_phase}; current phase is {}", p.current_phase);
    }
    Ok(())
}

fn run_delete(root: &Path, id: &str) -> Result<()> {
    project::delete(root, id)?;
    println!("deleted project {id}");
    Ok(())
}

fn summary_view(p: &Project) -> serde_json::Value {
    serde_json::json!({
        "id": p.id,
        "name": p.name,
        "status": p.status,
        "current_phase": p.current_phase,
        "client_ids": p.client_ids,
        "updated_at": p.updated_at,
    })
}
