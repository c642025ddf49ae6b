use chrono::Utc;
use clap::Subcommand;
use planbook_core::feedback::{FeedbackDraft, FeedbackStatus};
use uuid::Uuid;

use super::{print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum FeedbackAction {
    /// Submit a suggestion
    Submit {
        text: String,
        /// Clarified reading of the suggestion (defaults to the text)
        #[arg(long)]
        understanding: Option<String>,
    },
    /// List pending entries (or the archive)
    List {
        #[arg(long)]
        archived: bool,
    },
    /// Set status (pending, implemented, dismissed)
    Status { id: Uuid, status: FeedbackStatus },
    /// Move an implemented or dismissed entry to the archive
    Archive { id: Uuid },
    /// Delete an entry
    Delete { id: Uuid },
}

pub fn run(action: FeedbackAction) -> CmdResult {
    let ctx = Context::open()?;
    let mut log = ctx.store.load_feedback()?;

    match action {
        FeedbackAction::Submit {
            text,
            understanding,
        } => {
            let entry = log.submit(
                FeedbackDraft {
                    original_text: text,
                    final_understanding: understanding,
                    understanding_history: Vec::new(),
                },
                Utc::now(),
            )?;
            ctx.store.save_feedback(&log)?;
            print_json(&entry)?;
        }
        FeedbackAction::List { archived } => {
            if archived {
                print_json(&log.archived)?;
            } else {
                print_json(&log.pending)?;
            }
        }
        FeedbackAction::Status { id, status } => {
            log.set_status(id, status)?;
            ctx.store.save_feedback(&log)?;
            print_json(log.get(id)?)?;
        }
        FeedbackAction::Archive { id } => {
            let entry = log.archive(id, Utc::now())?;
            ctx.store.save_feedback(&log)?;
            print_json(&entry)?;
        }
        FeedbackAction::Delete { id } => {
            let entry = log.delete(id)?;
            ctx.store.save_feedback(&log)?;
            print_json(&serde_json::json!({ "deleted": entry.id }))?;
        }
    }
    Ok(())
}
