//! JSON output for the CLI
//!
//! Every command prints exactly one JSON object on stdout.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use super::errors::CliResult;

/// Wrap `data` in a success envelope
pub fn response(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: &T) -> CliResult<()> {
    let response = response(serde_json::to_value(data)?);

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_envelope() {
        let value = response(serde_json::json!({ "allowed": true }));
        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["allowed"], true);
    }
}
