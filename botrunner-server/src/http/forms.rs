//! Form posts from the control page
//!
//! Both handlers answer with a redirect back to `/` carrying a notice code,
//! so a page reload never re-submits the form.

use std::sync::Arc;

use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::notice::Notice;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StartForm {
    #[serde(default)]
    pub token: String,
}

pub async fn start_bot(State(state): State<Arc<AppState>>, Form(form): Form<StartForm>) -> Redirect {
    let notice = match state.bot.start(&form.token).await {
        Ok(started) => {
            info!(session_id = %started.session_id, "Bot started from control page");
            Notice::Started
        }
        Err(e) => {
            warn!(error = e.code(), "Start from control page failed: {}", e);
            Notice::from(&e)
        }
    };
    Redirect::to(&notice.location())
}

pub async fn stop_bot(State(state): State<Arc<AppState>>) -> Redirect {
    let notice = match state.bot.stop().await {
        Ok(stopped) => {
            info!(graceful = stopped.graceful, "Bot stopped from control page");
            Notice::Stopped
        }
        Err(e) => Notice::from(&e),
    };
    Redirect::to(&notice.location())
}
