// Copyright 2018 Dmitry Tantsur <divius.inside@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Command-line client for the Compute API.

use std::fs;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use waiter::Waiter;

use novaclient::auth::{AuthProvider, NoAuth, Token};
use novaclient::compute::{self, KeyPairQuery, KeyPairType, LiveMigration, NewKeyPair};
use novaclient::transport::HttpTransport;
use novaclient::{config, Client, Config, Error, ErrorKind, Result};

const DEFAULT_API_VERSION: &str = "latest";

#[derive(Parser, Debug)]
#[command(name = "nova")]
#[command(about = "Command-line interface to the OpenStack Compute API")]
struct Cli {
    /// Compute API version: 2, 2.X or latest [default: latest]
    #[arg(long, env = "OS_COMPUTE_API_VERSION")]
    os_compute_api_version: Option<String>,

    /// Service type in the catalog
    #[arg(long, env = "NOVA_SERVICE_TYPE", default_value = config::DEFAULT_SERVICE_TYPE)]
    service_type: String,

    /// Compute endpoint URL
    #[arg(long, env = "OS_ENDPOINT")]
    os_endpoint: Option<String>,

    /// Pre-issued authentication token
    #[arg(long, env = "OS_TOKEN", hide_env_values = true)]
    os_token: Option<String>,

    /// Cloud name from clouds.yaml
    #[arg(long, env = "OS_CLOUD", conflicts_with = "os_endpoint")]
    os_cloud: Option<String>,

    /// Endpoint interface
    #[arg(long, env = "OS_INTERFACE")]
    os_interface: Option<String>,

    /// Region name
    #[arg(long, env = "OS_REGION_NAME")]
    os_region_name: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Print call timing information
    #[arg(long, env = "NOVACLIENT_TIMINGS")]
    timings: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KeyType {
    Ssh,
    X509,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List API versions supported by the server
    VersionList,
    /// List servers
    List,
    /// Show details about a server
    Show {
        /// Server ID
        server: String,
    },
    /// Delete a server
    Delete {
        /// Server ID
        server: String,
        /// Wait for the server to disappear
        #[arg(long)]
        wait: bool,
    },
    /// List flavors
    FlavorList,
    /// List key pairs
    KeypairList {
        /// List key pairs of this user (2.10+)
        #[arg(long)]
        user: Option<String>,
        /// Maximum number of key pairs to return (2.35+)
        #[arg(long)]
        limit: Option<usize>,
        /// Last key pair of the previous page (2.35+)
        #[arg(long)]
        marker: Option<String>,
    },
    /// Create or import a key pair
    KeypairAdd {
        /// Key pair name
        name: String,
        /// Path to a public key to import
        #[arg(long)]
        pub_key: Option<String>,
        /// Key type (2.2+)
        #[arg(long, value_enum)]
        key_type: Option<KeyType>,
    },
    /// Live migrate a server
    LiveMigration {
        /// Server ID
        server: String,
        /// Destination host, the scheduler picks one if omitted
        host: Option<String>,
        /// Use block migration
        #[arg(long)]
        block_migrate: bool,
        /// Bypass scheduler checks (2.30+)
        #[arg(long)]
        force: bool,
    },
    /// List in-progress migrations of a server (2.23+)
    ServerMigrationList {
        /// Server ID
        server: String,
    },
}

impl From<KeyType> for KeyPairType {
    fn from(value: KeyType) -> KeyPairType {
        match value {
            KeyType::Ssh => KeyPairType::Ssh,
            KeyType::X509 => KeyPairType::X509,
        }
    }
}

fn load(cli: &Cli) -> Result<(Config, Box<dyn AuthProvider>)> {
    let (config, auth) = match (&cli.os_cloud, &cli.os_endpoint) {
        (Some(cloud), _) => config::from_config(cloud)?,
        (None, Some(endpoint)) => {
            let auth: Box<dyn AuthProvider> = match cli.os_token {
                Some(ref token) => Box::new(Token::new(endpoint, token.clone())?),
                None => Box::new(NoAuth::new(endpoint)?),
            };
            (Config::from_env()?, auth)
        }
        (None, None) => {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                "Either --os-cloud or --os-endpoint is required",
            ))
        }
    };

    let config = merge(cli, config);
    debug!("Using configuration {:?}", config);
    Ok((config, auth))
}

/// Apply command line overrides on top of the loaded configuration.
fn merge(cli: &Cli, mut config: Config) -> Config {
    if cli.os_compute_api_version.is_some() {
        config.api_version = cli.os_compute_api_version.clone();
    }
    if config.api_version.is_none() {
        config.api_version = Some(String::from(DEFAULT_API_VERSION));
    }
    // Dynamic negotiation is always allowed on the command line.
    config.allow_latest = true;
    config.service_type = cli.service_type.clone();
    if cli.os_interface.is_some() {
        config.endpoint_interface = cli.os_interface.clone();
    }
    if cli.os_region_name.is_some() {
        config.region_name = cli.os_region_name.clone();
    }
    if cli.timeout.is_some() {
        config.timeout = cli.timeout;
    }
    config.timings = config.timings || cli.timings;
    config
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|x| x.to_string()).unwrap_or_else(|| String::from("-"))
}

fn run(client: &mut Client, command: &Command) -> Result<()> {
    if let Command::VersionList = command {
        let info = client.discover()?;
        let (min, max) = info.version_range();
        println!("URL: {}", info.root_url);
        println!("Minimum version: {}", min);
        println!("Maximum version: {}", max);
        return Ok(());
    }

    let session = client.negotiate()?;
    debug!("Negotiated {:?}", session);

    match command {
        Command::VersionList => (),
        Command::List => {
            for server in compute::servers(client).list()? {
                println!("{}\t{}\t{}", server.id(), server.name(), server.status());
            }
        }
        Command::Show { server } => {
            let server = compute::servers(client).get(server)?;
            println!("id: {}", server.id());
            println!("name: {}", server.name());
            println!("status: {}", server.status());
            println!("host: {}", or_dash(server.host()));
            println!("image: {}", or_dash(server.image_id()));
            println!("created: {}", or_dash(server.created_at()));
            let mut networks: Vec<_> = server.addresses().iter().collect();
            networks.sort_by(|a, b| a.0.cmp(b.0));
            for (network, addresses) in networks {
                let addresses: Vec<&str> = addresses.iter().map(|x| x.addr.as_str()).collect();
                println!("{} network: {}", network, addresses.join(", "));
            }
        }
        Command::Delete { server, wait } => {
            let server = compute::servers(client).get(server)?;
            let waiter = server.delete()?;
            if *wait {
                waiter.wait()?;
            }
        }
        Command::FlavorList => {
            for flavor in compute::flavors(client).list()? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    flavor.id(),
                    flavor.name(),
                    flavor.ram_size(),
                    flavor.root_size(),
                    flavor.vcpu_count()
                );
            }
        }
        Command::KeypairList {
            user,
            limit,
            marker,
        } => {
            let query = KeyPairQuery {
                user_id: user.clone(),
                limit: *limit,
                marker: marker.clone(),
            };
            for keypair in compute::keypairs(client).list(&query)? {
                println!(
                    "{}\t{}\t{}",
                    keypair.name(),
                    or_dash(keypair.key_type()),
                    keypair.fingerprint()
                );
            }
        }
        Command::KeypairAdd {
            name,
            pub_key,
            key_type,
        } => {
            let mut request = NewKeyPair::new(name.clone());
            if let Some(path) = pub_key {
                let public_key = fs::read_to_string(path).map_err(|e| {
                    Error::new(
                        ErrorKind::InvalidInput,
                        format!("Cannot read public key {}: {}", path, e),
                    )
                })?;
                request = request.with_public_key(public_key.trim());
            }
            if let Some(key_type) = key_type {
                request = request.with_key_type((*key_type).into());
            }
            let keypair = compute::keypairs(client).create(&request)?;
            if let Some(private_key) = keypair.private_key() {
                println!("{}", private_key);
            }
        }
        Command::LiveMigration {
            server,
            host,
            block_migrate,
            force,
        } => {
            let mut args = LiveMigration::new().with_force(*force);
            if let Some(host) = host {
                args = args.with_host(host.clone());
            }
            if *block_migrate {
                args = args.with_block_migration(true);
            }
            compute::servers(client).live_migrate(server, &args)?;
        }
        Command::ServerMigrationList { server } => {
            for migration in compute::server_migrations(client, server.clone()).list()? {
                println!(
                    "{}\t{}\t{}\t{}",
                    migration.id(),
                    migration.status(),
                    or_dash(migration.source_compute()),
                    or_dash(migration.dest_compute())
                );
            }
        }
    }

    Ok(())
}

fn print_timings(client: &Client) {
    let timings = client.timings();
    let mut total = 0.0;
    for (label, elapsed) in &timings {
        println!("{}\t{:.3}", label, elapsed);
        total += elapsed;
    }
    println!("Total\t{:.3}", total);
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let (config, auth) = match load(&cli) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            process::exit(1);
        }
    };
    let transport = match HttpTransport::new(config.timeout_duration()) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            process::exit(1);
        }
    };
    let timings = config.timings;
    let mut client = Client::new(config, auth, Box::new(transport));

    let result = run(&mut client, &cli.command);
    if timings {
        print_timings(&client);
    }
    if let Err(err) = result {
        eprintln!("ERROR: {}", err);
        process::exit(1);
    }
}
