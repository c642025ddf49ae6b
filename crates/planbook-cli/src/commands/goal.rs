use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use planbook_core::goal::{
    Closeness, GoalId, GoalReview, GoalStatus, GoalType, GoalView, NewGoal, Priority, Progress,
    ReviewEntry, ReviewKind, StageDescriptions,
};

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Add a top-level goal
    Add {
        name: String,
        /// long_term, yearly, monthly or weekly
        #[arg(long = "type", default_value = "long_term")]
        goal_type: GoalType,
        /// high, medium or low
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long)]
        deadline: Option<NaiveDate>,
        /// What each stage means for this goal, as four values:
        /// positive, negative, current, improve
        #[arg(long, num_args = 4, value_names = ["POSITIVE", "NEGATIVE", "CURRENT", "IMPROVE"])]
        stages: Option<Vec<String>>,
    },
    /// List active goals (or the archive)
    List {
        #[arg(long)]
        archived: bool,
    },
    /// Show one goal with its sub-goals
    Show { id: GoalId },
    /// Set progress (0-100)
    Progress { id: GoalId, value: u32 },
    /// Add a sub-goal under a goal
    Sub {
        parent: GoalId,
        name: String,
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    /// Mark a goal completed (requires 100%)
    Complete { id: GoalId },
    /// Set status (active, completed, archived)
    Status { id: GoalId, status: GoalStatus },
    /// Archive a goal
    Archive { id: GoalId },
    /// Delete a goal and its sub-goals
    Delete { id: GoalId },
    /// Record a review
    Review {
        /// weekly, monthly or yearly
        kind: ReviewKind,
        /// Per-goal update as ID=PROGRESS[:CLOSER] (repeatable)
        #[arg(long = "goal", value_parser = parse_review_entry)]
        entries: Vec<(GoalId, Progress, Closeness)>,
        #[arg(long, default_value = "")]
        overall: String,
    },
    /// Review kinds that are due
    ReviewsDue,
}

/// `3.1=40` or `3.1=40:steady`.
fn parse_review_entry(raw: &str) -> Result<(GoalId, Progress, Closeness), String> {
    let (id, rest) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=PROGRESS[:CLOSER], got '{raw}'"))?;
    let (progress, closer) = match rest.split_once(':') {
        Some((progress, closer)) => (progress, closer.parse().map_err(|e| format!("{e}"))?),
        None => (rest, Closeness::default()),
    };
    let id: GoalId = id.parse().map_err(|e| format!("{e}"))?;
    let progress = progress
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("{e}"))
        .and_then(|p| Progress::new(p).map_err(|e| format!("{e}")))?;
    Ok((id, progress, closer))
}

pub fn run(action: GoalAction) -> CmdResult {
    let ctx = Context::open()?;
    let mut book = ctx.store.load_goals()?;
    let now = Utc::now();

    match action {
        GoalAction::Add {
            name,
            goal_type,
            priority,
            deadline,
            stages,
        } => {
            let stage_descriptions = stages.map(|s| StageDescriptions {
                positive: s[0].clone(),
                negative: s[1].clone(),
                current: s[2].clone(),
                improve: s[3].clone(),
            });
            let id = book.add_goal(
                NewGoal {
                    name,
                    goal_type,
                    priority,
                    deadline,
                    stage_descriptions,
                },
                now,
            )?;
            ctx.store.save_goals(&book)?;
            print_json(&GoalView::of(book.get(&id)?, now))?;
        }
        GoalAction::List { archived } => {
            if archived {
                print_json(&book.archived)?;
            } else {
                print_json(&book.view(now))?;
            }
        }
        GoalAction::Show { id } => {
            print_json(&GoalView::of(book.get(&id)?, now))?;
        }
        GoalAction::Progress { id, value } => {
            let update = book.update_progress(&id, value, now)?;
            ctx.store.save_goals(&book)?;
            print_json(&update)?;
        }
        GoalAction::Sub {
            parent,
            name,
            deadline,
        } => {
            let id = book.add_sub_goal(&parent, &name, deadline, now)?;
            ctx.store.save_goals(&book)?;
            print_json(&GoalView::of(book.get(&id)?, now))?;
        }
        GoalAction::Complete { id } => {
            book.complete(&id, now)?;
            ctx.store.save_goals(&book)?;
            print_json(&GoalView::of(book.get(&id)?, now))?;
        }
        GoalAction::Status { id, status } => {
            book.set_status(&id, status, now)?;
            ctx.store.save_goals(&book)?;
            print_json(&serde_json::json!({ "id": id, "status": status }))?;
        }
        GoalAction::Archive { id } => {
            book.archive(&id, now)?;
            ctx.store.save_goals(&book)?;
            print_json(&serde_json::json!({ "id": id, "status": GoalStatus::Archived }))?;
        }
        GoalAction::Delete { id } => {
            let removed = book.delete(&id)?;
            ctx.store.save_goals(&book)?;
            print_json(&serde_json::json!({ "deleted": removed.id, "name": removed.name }))?;
        }
        GoalAction::Review {
            kind,
            entries,
            overall,
        } => {
            let mut review = GoalReview::new(kind, now);
            review.overall = overall;
            for (id, progress_after, closer) in entries {
                let goal = book.get(&id)?;
                review.entries.push(ReviewEntry {
                    goal_name: goal.name.clone(),
                    progress_before: goal.progress,
                    progress_after,
                    done: String::new(),
                    not_done: String::new(),
                    closer,
                    next_actions: String::new(),
                    goal_id: id,
                });
            }
            book.record_review(review.clone())?;
            ctx.store.save_goals(&book)?;
            print_json(&review)?;
        }
        GoalAction::ReviewsDue => {
            print_json(&book.reviews_due(now))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_entry_syntax() {
        let (id, progress, closer) = parse_review_entry("3.1=40:great").unwrap();
        assert_eq!(id.as_str(), "3.1");
        assert_eq!(progress.value(), 40);
        assert_eq!(closer, Closeness::Great);

        let (_, _, closer) = parse_review_entry("2=10").unwrap();
        assert_eq!(closer, Closeness::Same);

        assert!(parse_review_entry("2").is_err());
        assert!(parse_review_entry("2=101").is_err());
        assert!(parse_review_entry("x=10").is_err());
        assert!(parse_review_entry("2=10:meh").is_err());
    }
}
