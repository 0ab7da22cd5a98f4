use serde::Serialize;

/// JSON envelope printed on stdout by every command.
#[derive(Debug, Serialize)]
pub struct CommandOutput<T>
where
    T: Serialize,
{
    pub status: &'static str,
    pub command: &'static str,
    pub result: T,
}

impl<T: Serialize> CommandOutput<T> {
    pub fn success(command: &'static str, result: T) -> Self {
        Self {
            status: "success",
            command,
            result,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SmokeReport {
    pub public_key: String,
    pub funded: bool,
    pub balance: String,
    pub contract_result: serde_json::Value,
}
