/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "qg.toml";

pub const USAGE: &str = "usage: qg_fetch [--config <path>] <url>...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub config_path: String,
    pub urls: Vec<String>,
    pub help: bool,
}

/// Parses `[--config <path>] <url>...` from the arguments after the program name
pub fn parse_args<I>(args: I) -> Result<CliArgs, String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut parsed = CliArgs { config_path: DEFAULT_CONFIG_PATH.to_string(), urls: Vec::new(), help: false };
    let mut args = args.into_iter().map(Into::into);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => parsed.help = true,
            "-c" | "--config" => {
                parsed.config_path = args.next().ok_or_else(|| format!("{arg} requires a path"))?;
            }
            flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
            _ => parsed.urls.push(arg),
        }
    }

    Ok(parsed)
}

/// Parses the process arguments
pub fn from_env() -> Result<CliArgs, String> {
    parse_args(std::env::args().skip(1))
}
