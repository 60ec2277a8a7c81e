use super::{open_session, CommandResult};

pub fn run() -> CommandResult {
    let (_, session) = open_session()?;
    println!("{}", session.user_id());
    Ok(())
}
