use structopt::StructOpt;

/// Delete Elasticsearch indices whose name date is more than 4 days old
#[derive(StructOpt, Debug)]
#[structopt(name = "elasticsearch-retention")]
pub struct Opt {
    /// Verbose mode (-v, -vv, -vvv, etc.), logs go to stderr
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: u8,

    /// Elasticsearch nodes, i.e `es1`, `es1:9200` or `https://es1:9243`
    #[structopt(name = "HOSTNAME[:PORT]")]
    pub hosts: Vec<String>,
}

/// Usage line printed when no host is given
pub fn usage(program: &str) -> String {
    format!("USAGE: {} HOSTNAME[:PORT] ...", program)
}
