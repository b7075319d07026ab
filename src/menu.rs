use argp::FromArgs;

/// Extracts managed assemblies packed into a mobile toolkit's AssemblyStore blobs.
#[derive(FromArgs, PartialEq, Debug)]
#[argp(description = "Extract .NET assemblies out of AssemblyStore blobs.")]
pub struct Arguments {
    #[argp(option, short = 'v', global, default = "0")]
    #[argp(description = "Logging level (0 = Off, 1 = Error, 2 = Warn, 3 = Info, 4 = Debug, 5 = Trace)")]
    pub verbose: usize,

    /// Directory to recursively search for `.blob` stores and `assemblies.manifest`.
    #[argp(positional)]
    pub input_dir: Option<String>,

    /// Directory assemblies are written under.
    #[argp(positional)]
    pub output_dir: Option<String>,
}
