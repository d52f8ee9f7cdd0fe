//! Bootstrap an admin account from the command line:
//!
//!     create-admin <username> <email> <password>

use std::process::ExitCode;

use sqlx::postgres::PgPoolOptions;

use markblog::auth::password::hash_password;
use markblog::users::repo::User;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let mut args = std::env::args().skip(1);
    let (Some(username), Some(email), Some(password)) = (args.next(), args.next(), args.next())
    else {
        eprintln!("usage: create-admin <username> <email> <password>");
        return Ok(ExitCode::FAILURE);
    };

    let database_url = std::env::var("DATABASE_URL")?;
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    if User::find_by_username(&db, &username).await?.is_some() {
        eprintln!("user {username} already exists");
        return Ok(ExitCode::FAILURE);
    }

    let hash = hash_password(&password)?;
    let user = User::create(&db, &username, &email, &hash, true, true).await?;

    println!("admin user {} created (id {})", user.username, user.id);
    Ok(ExitCode::SUCCESS)
}
