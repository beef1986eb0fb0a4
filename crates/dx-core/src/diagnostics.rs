/// Error codes shown in front of failed human output, one per command.
pub mod commands {
    pub const INIT: &str = "DX101";
    pub const CHECK: &str = "DX110";
    pub const REALIZE: &str = "DX120";
    pub const ENV: &str = "DX130";
    pub const SHELL: &str = "DX140";
}
