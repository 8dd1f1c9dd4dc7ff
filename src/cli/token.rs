use anyhow::Result;

use crate::config::MurmurConfig;
use crate::db::{self, tokens};

/// Issue an API token for `user`, or revoke all of that user's tokens.
pub fn token(config: &MurmurConfig, user: &str, revoke: bool) -> Result<()> {
    let conn = db::open_database(config.resolved_db_path())?;

    if revoke {
        let n = tokens::revoke_tokens(&conn, user)?;
        println!("Revoked {n} token(s) for '{user}'.");
        return Ok(());
    }

    let token = tokens::issue_token(&conn, user)?;
    println!("{token}");
    eprintln!("Send it as `Authorization: Bearer <token>`.");
    Ok(())
}
