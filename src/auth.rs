use anyhow::Result;
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub const PASSWORD_ENV: &str = "CRYPTALGO_PASSWORD";

/// Password for key derivation: env var, then piped stdin, then a TTY prompt.
///
/// Returns an empty string when nothing was supplied; the engine rejects it as
/// `EmptyPassword`.
pub fn read_password() -> Result<Zeroizing<String>> {
    //  CRYPTALGO_PASSWORD="secret" cryptalgo keys derive
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    //  printf "%s" "secret" | cryptalgo keys derive
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut buf)?;
        trim_newline(&mut buf);

        if !buf.is_empty() {
            return Ok(buf);
        }
    }

    if io::stdin().is_terminal() {
        return Ok(Zeroizing::new(rpassword::prompt_password("Password: ")?));
    }

    Ok(Zeroizing::new(String::new()))
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
