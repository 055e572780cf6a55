use serde::Serialize;

use super::Context;
use crate::error::Result;
use crate::model::Member;
use crate::output::{emit_success, HumanOutput};

#[derive(Serialize)]
struct MemberListReport<'a> {
    scope: &'static str,
    count: usize,
    members: &'a [Member],
}

/// `taskdeck member list` or, with `mine`, `taskdeck member mine`.
pub async fn run_list(ctx: &mut Context, mine: bool) -> Result<()> {
    let session = ctx.session()?;
    let commands = ctx.commands(&session)?;
    if mine {
        commands.fetch_team_members().await?;
    } else {
        commands.fetch_members().await?;
    }

    let snapshot = commands.store().snapshot();
    let (scope, command, members) = if mine {
        ("my-teams", "member mine", snapshot.members().team_members())
    } else {
        ("all", "member list", snapshot.members().members())
    };

    let mut human = HumanOutput::new(format!("taskdeck {command}: {} member(s)", members.len()));
    for member in members {
        human.push_detail(format!("{}  {} <{}>", member.id, member.name, member.email));
    }
    if mine && members.is_empty() {
        human.push_next_step("taskdeck team mine");
    }

    let report = MemberListReport {
        scope,
        count: members.len(),
        members,
    };
    emit_success(ctx.output, command, &report, Some(&human))
}
