use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dbexport",
    version,
    about = "Export a SQL query or cursor-returning call to delimited text"
)]
pub struct Cli {
    /// Path to config file
    #[arg(long, global = true, env = "DBEXPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit diagnostics to stderr
    #[arg(short = 'v', long, global = true, env = "DBEXPORT_VERBOSE")]
    pub verbose: bool,

    /// Disable credential masking in diagnostics
    #[arg(long, global = true, env = "DBEXPORT_SHOW_SECRETS")]
    pub show_secrets: bool,

    #[command(flatten)]
    pub export: ExportArgs,
}

#[derive(Parser, Debug, Default)]
pub struct ExportArgs {
    /// Query text; repeat to split it: -q "select sysdate" -q "from dual".
    /// Read from standard input when neither --query nor --ref-cursor is given
    #[arg(short = 'q', long = "query")]
    pub query: Vec<String>,

    /// Call returning a cursor: "{CALL proc_returning_cursor()}"
    #[arg(long = "ref-cursor")]
    pub ref_cursor: Vec<String>,

    /// ODBC connection string, or a DSN name
    #[arg(short = 'c', long, env = "DBEXPORT_CONNECT")]
    pub connect: Option<String>,

    /// Database user
    #[arg(short = 'u', long, env = "DBEXPORT_USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(short = 'p', long, env = "DBEXPORT_PASSWORD")]
    pub password: Option<String>,

    /// First line holds the column names
    #[arg(long)]
    pub with_header: bool,

    /// Terminate lines with CRLF instead of LF
    #[arg(long = "use-crlf")]
    pub use_crlf: bool,

    /// Field delimiter, e.g. "\t" for tab (default: ",")
    #[arg(short = 'd', long)]
    pub delimiter: Option<String>,

    /// Text written for NULL values (default: empty)
    #[arg(long)]
    pub null_text: Option<String>,

    /// strftime pattern for dates and timestamps (default: %Y-%m-%dT%H:%M:%S)
    #[arg(long)]
    pub date_format: Option<String>,

    /// Write to file instead of stdout
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Config file profile name
    #[arg(short = 'P', long, env = "DBEXPORT_PROFILE")]
    pub profile: Option<String>,

    /// Login timeout in seconds (default: 30)
    #[arg(long)]
    pub login_timeout: Option<u32>,

    /// Rows fetched per round trip (default: 1000)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Max bytes fetched per text cell (default: 4000)
    #[arg(long)]
    pub max_text_len: Option<usize>,
}
