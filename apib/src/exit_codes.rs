#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// Single-request mode and that request failed.
    RequestFailed = 20,

    /// Invalid CLI/config input (bad flags, URL, header, method, body file, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors, worker task failures).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
