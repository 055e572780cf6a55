//! taskdeck team list/mine/create/update/delete/add-members

use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::events::EventKind;
use crate::model::{NewTeam, Team, TeamMembersRequest, TeamPatch};
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct TeamListReport<'a> {
    scope: &'static str,
    count: usize,
    teams: &'a [Team],
}

#[derive(Serialize)]
struct TeamDeleteReport {
    id: String,
    deleted: bool,
}

fn format_team(team: &Team) -> String {
    let mut line = format!("{}  {}  ({} member(s))", team.id, team.name, team.members.len());
    if !team.description.is_empty() {
        line.push_str(&format!("  {}", team.description));
    }
    line
}

pub async fn run_list(ctx: &mut Context, mine: bool) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    if mine {
        commands.fetch_user_teams().await?;
    } else {
        commands.fetch_teams().await?;
    }

    let snapshot = commands.store().snapshot();
    let (scope, command, teams) = if mine {
        ("mine", "team mine", snapshot.teams().user_teams())
    } else {
        ("all", "team list", snapshot.teams().teams())
    };

    let mut human = HumanOutput::new(format!("taskdeck {command}: {} team(s)", teams.len()));
    for team in teams {
        human.push_detail(format_team(team));
    }
    if teams.is_empty() {
        human.push_next_step("taskdeck team create --name <name> --member <id>");
    }

    let report = TeamListReport {
        scope,
        count: teams.len(),
        teams,
    };
    emit_success(ctx.output, command, &report, Some(&human))
}

pub async fn run_create(
    ctx: &mut Context,
    name: String,
    description: String,
    members: Vec<String>,
) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    let team = commands
        .create_team(NewTeam {
            name,
            description,
            members,
        })
        .await?;

    ctx.emit_event(EventKind::TeamCreated, Some(&session.display_name), &team)?;

    let mut human = HumanOutput::new(format!("taskdeck team create: {}", team.id));
    human.push_detail(format_team(&team));
    emit_success(ctx.output, "team create", &team, Some(&human))
}

pub async fn run_update(
    ctx: &mut Context,
    id: String,
    name: Option<String>,
    description: Option<String>,
    members: Option<Vec<String>>,
) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    let team = commands
        .update_team(
            &id,
            TeamPatch {
                name,
                description,
                members,
            },
        )
        .await?;

    ctx.emit_event(EventKind::TeamUpdated, Some(&session.display_name), &team)?;

    let mut human = HumanOutput::new(format!("taskdeck team update: {}", team.id));
    human.push_detail(format_team(&team));
    emit_success(ctx.output, "team update", &team, Some(&human))
}

pub async fn run_delete(ctx: &mut Context, id: String) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    let id = commands.delete_team(&id).await?;

    ctx.emit_event(
        EventKind::TeamDeleted,
        Some(&session.display_name),
        serde_json::json!({ "id": id }),
    )?;

    let human = HumanOutput::new(format!("taskdeck team delete: {id}"));
    let report = TeamDeleteReport { id, deleted: true };
    emit_success(ctx.output, "team delete", &report, Some(&human))
}

pub async fn run_add_members(ctx: &mut Context, team: String, members: Vec<String>) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    let updated = commands
        .add_team_members(TeamMembersRequest {
            team_id: team,
            user_ids: members.clone(),
        })
        .await?;

    ctx.emit_event(
        EventKind::TeamMembersAdded,
        Some(&session.display_name),
        serde_json::json!({ "team": updated.id, "members": members }),
    )?;

    let mut human = HumanOutput::new(format!("taskdeck team add-members: {}", updated.id));
    human.push_summary("added", members.len().to_string());
    human.push_detail(format_team(&updated));
    emit_success(ctx.output, "team add-members", &updated, Some(&human))
}
