//! Choosing which game account to play.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;

use crate::error::LauncherError;
use crate::provider::{Account, UserDetails};

/// Presents accounts and reports the user's choice.
///
/// `Ok(None)` is an explicit "nothing chosen" and is not an error.
#[async_trait]
pub trait AccountPicker: Send + Sync {
    async fn choose(
        &self,
        user: &UserDetails,
        accounts: &[Account],
    ) -> Result<Option<Account>, LauncherError>;
}

/// Numbered prompt on stdin/stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPicker;

#[async_trait]
impl AccountPicker for TerminalPicker {
    async fn choose(
        &self,
        user: &UserDetails,
        accounts: &[Account],
    ) -> Result<Option<Account>, LauncherError> {
        let user = user.clone();
        let accounts = accounts.to_vec();
        tokio::task::spawn_blocking(move || {
            let stdin = io::stdin();
            let stdout = io::stdout();
            prompt_for_account(&mut stdin.lock(), &mut stdout.lock(), &user, &accounts)
        })
        .await
        .map_err(|err| LauncherError::Picker(err.to_string()))?
    }
}

/// Drive one selection over arbitrary reader/writer pairs.
///
/// Invalid entries re-prompt; `q`, an empty line or end of input select nothing.
pub fn prompt_for_account<R, W>(
    input: &mut R,
    output: &mut W,
    user: &UserDetails,
    accounts: &[Account],
) -> Result<Option<Account>, LauncherError>
where
    R: BufRead,
    W: Write,
{
    let picker_err = |err: io::Error| LauncherError::Picker(err.to_string());

    writeln!(output, "You are logged in as: {user}").map_err(picker_err)?;
    if accounts.is_empty() {
        writeln!(output, "No game accounts found.").map_err(picker_err)?;
        return Ok(None);
    }

    writeln!(output, "Choose an account:").map_err(picker_err)?;
    for (idx, account) in accounts.iter().enumerate() {
        writeln!(output, "  {}. {}", idx + 1, account.display_name).map_err(picker_err)?;
    }

    loop {
        write!(output, "Account [1-{}, q to quit]: ", accounts.len()).map_err(picker_err)?;
        output.flush().map_err(picker_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(picker_err)? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match answer.parse::<usize>() {
            Ok(n) if (1..=accounts.len()).contains(&n) => return Ok(Some(accounts[n - 1].clone())),
            _ => writeln!(output, "Not a valid choice: {answer}").map_err(picker_err)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn user() -> UserDetails {
        UserDetails {
            display_name: "Zezima".to_string(),
            id: "1".to_string(),
            suffix: "0001".to_string(),
            user_id: "u".to_string(),
        }
    }

    fn accounts() -> Vec<Account> {
        ["Main", "Iron"]
            .iter()
            .enumerate()
            .map(|(idx, name)| Account {
                account_id: idx.to_string(),
                display_name: name.to_string(),
                user_hash: String::new(),
            })
            .collect()
    }

    fn run(input: &str, accounts: &[Account]) -> (Option<Account>, String) {
        let mut output = Vec::new();
        let choice =
            prompt_for_account(&mut Cursor::new(input), &mut output, &user(), accounts).unwrap();
        (choice, String::from_utf8(output).unwrap())
    }

    #[test]
    fn picks_numbered_account() {
        let (choice, output) = run("2\n", &accounts());
        assert_eq!(choice.unwrap().display_name, "Iron");
        assert!(output.starts_with("You are logged in as: Zezima#0001\n"));
        assert!(output.contains("  1. Main\n"));
    }

    #[test]
    fn reprompts_on_invalid_entry() {
        let (choice, output) = run("7\nabc\n1\n", &accounts());
        assert_eq!(choice.unwrap().display_name, "Main");
        assert!(output.contains("Not a valid choice: 7"));
        assert!(output.contains("Not a valid choice: abc"));
    }

    #[test]
    fn quit_empty_or_eof_choose_nothing() {
        for input in ["q\n", "\n", ""] {
            assert_eq!(run(input, &accounts()).0, None, "{input:?}");
        }
    }

    #[test]
    fn empty_account_list_chooses_nothing() {
        let (choice, output) = run("1\n", &[]);
        assert_eq!(choice, None);
        assert!(output.contains("No game accounts found."));
    }
}
