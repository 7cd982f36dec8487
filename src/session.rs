use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::{controller::Notice, AppResult};

pub const VIEWER: &str = "viewer";
pub const RETURN_URL: &str = "return_url";
pub const NOTICE: &str = "notice";

/// The signed-in account, passed explicitly into every call that acts on its behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewer {
    pub user_name: String,
    pub token: String,
}

pub async fn viewer(session: &Session) -> AppResult<Option<Viewer>> {
    Ok(session.get::<Viewer>(VIEWER).await?)
}

/// Queue a notice for the next rendered page.
pub async fn flash(session: &Session, notice: Notice) -> AppResult<()> {
    session.insert(NOTICE, notice).await?;
    Ok(())
}

pub async fn take_flash(session: &Session) -> AppResult<Option<Notice>> {
    Ok(session.remove::<Notice>(NOTICE).await?)
}
