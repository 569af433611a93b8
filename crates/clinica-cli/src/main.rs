//! CLI entry point for the Clinica graph.
//!
//! One subcommand per manager operation. Writes a JSON envelope to stdout
//! carrying the HTTP-style status, a message, and any returned records;
//! exits non-zero when the status is not 200.

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use clinica_core::config::ClinicaConfig;
use clinica_core::error::Result as ClinicaResult;
use clinica_core::{ClinicaError, Outcome};
use clinica_graph::schema::{ensure_schema, verify_connectivity};
use clinica_graph::{Clinica, GraphClient, GraphConfig};

#[derive(Parser)]
#[command(name = "clinica")]
#[command(about = "Physicians, patients, and prescriptions in a Neo4j graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: clinica).
    #[arg(short, long, default_value = "clinica", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Physician operations.
    Medico {
        #[command(subcommand)]
        action: MedicoAction,
    },
    /// Patient operations.
    Paciente {
        #[command(subcommand)]
        action: PacienteAction,
    },
    /// Prescription operations.
    Prescricao {
        #[command(subcommand)]
        action: PrescricaoAction,
    },
    /// Install store constraints.
    Schema,
    /// Check that the store is reachable.
    Ping,
}

#[derive(Subcommand)]
enum MedicoAction {
    Login {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        senha: String,
    },
    Create {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        senha: String,
    },
    List,
    Get {
        nome: String,
    },
    UpdateSenha {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        senha: String,
    },
    Delete {
        nome: String,
    },
}

#[derive(Subcommand)]
enum PacienteAction {
    Create {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        sobrenome: String,
    },
    List,
    Get {
        nome: String,
        sobrenome: String,
    },
    Rename {
        #[arg(long)]
        nome: String,
        #[arg(long)]
        sobrenome: String,
        #[arg(long)]
        novo_nome: String,
        #[arg(long)]
        novo_sobrenome: String,
    },
    Delete {
        nome: String,
        sobrenome: String,
    },
}

#[derive(Subcommand)]
enum PrescricaoAction {
    Link {
        #[arg(long)]
        medico: String,
        #[arg(long)]
        paciente: String,
        #[arg(long)]
        descricao: String,
    },
    List,
    Update {
        #[arg(long)]
        medico: String,
        #[arg(long)]
        paciente: String,
        #[arg(long)]
        descricao: String,
    },
}

#[derive(Debug, Serialize)]
struct Response {
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl Response {
    fn ok(message: &str) -> Self {
        Self {
            status: 200,
            message: message.to_string(),
            data: None,
        }
    }

    fn from_outcome(entity: &str, result: ClinicaResult<Outcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                status: outcome.status_code(),
                message: outcome.message(entity),
                data: None,
            },
            Err(e) => Self::from_error(&e),
        }
    }

    fn from_records<T: Serialize>(result: ClinicaResult<T>) -> anyhow::Result<Self> {
        Ok(match result {
            Ok(records) => Self {
                status: 200,
                message: "OK".to_string(),
                data: Some(serde_json::to_value(records)?),
            },
            Err(e) => Self::from_error(&e),
        })
    }

    fn from_error(e: &ClinicaError) -> Self {
        Self {
            status: e.status_code(),
            message: e.to_string(),
            data: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = ClinicaConfig::load(&cli.config)?;

    init_logging(&settings)?;
    tracing::debug!(
        config = %cli.config,
        uri = %settings.neo4j.uri,
        user = %settings.neo4j.user,
        "Configuration loaded"
    );

    let graph = GraphClient::connect(&GraphConfig::from(&settings)).await?;
    let clinica = Clinica::new(graph.clone());

    let response = run(cli.command, &graph, &clinica).await?;
    graph.close();

    println!("{}", serde_json::to_string(&response)?);
    if response.status != 200 {
        tracing::warn!(status = response.status, message = %response.message, "Operation failed");
        std::process::exit(1);
    }
    Ok(())
}

/// Install the stderr subscriber. The format comes from configuration, so
/// this runs right after loading it and before anything else is logged.
fn init_logging(settings: &ClinicaConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = if settings.log.json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {e}"))
}

async fn run(
    command: Command,
    graph: &GraphClient,
    clinica: &Clinica<GraphClient>,
) -> anyhow::Result<Response> {
    let response = match command {
        Command::Medico { action } => match action {
            MedicoAction::Login { nome, senha } => {
                Response::from_outcome("Medico", clinica.medicos.login(&nome, &senha).await)
            }
            MedicoAction::Create { nome, senha } => {
                Response::from_outcome("Medico", clinica.medicos.create(&nome, &senha).await)
            }
            MedicoAction::List => Response::from_records(clinica.medicos.list().await)?,
            MedicoAction::Get { nome } => {
                Response::from_records(clinica.medicos.get_by_name(&nome).await)?
            }
            MedicoAction::UpdateSenha { nome, senha } => Response::from_outcome(
                "Medico",
                clinica.medicos.update_password(&nome, &senha).await,
            ),
            MedicoAction::Delete { nome } => {
                Response::from_outcome("Medico", clinica.medicos.delete(&nome).await)
            }
        },
        Command::Paciente { action } => match action {
            PacienteAction::Create { nome, sobrenome } => Response::from_outcome(
                "Paciente",
                clinica.pacientes.create(&nome, &sobrenome).await,
            ),
            PacienteAction::List => Response::from_records(clinica.pacientes.list().await)?,
            PacienteAction::Get { nome, sobrenome } => Response::from_records(
                clinica
                    .pacientes
                    .get_by_name_and_surname(&nome, &sobrenome)
                    .await,
            )?,
            PacienteAction::Rename {
                nome,
                sobrenome,
                novo_nome,
                novo_sobrenome,
            } => Response::from_outcome(
                "Paciente",
                clinica
                    .pacientes
                    .rename(&nome, &sobrenome, &novo_nome, &novo_sobrenome)
                    .await,
            ),
            PacienteAction::Delete { nome, sobrenome } => Response::from_outcome(
                "Paciente",
                clinica.pacientes.delete(&nome, &sobrenome).await,
            ),
        },
        Command::Prescricao { action } => match action {
            PrescricaoAction::Link {
                medico,
                paciente,
                descricao,
            } => Response::from_outcome(
                "Prescricao",
                clinica.prescricoes.link(&medico, &paciente, &descricao).await,
            ),
            PrescricaoAction::List => {
                Response::from_records(clinica.prescricoes.list_with_prescriptions().await)?
            }
            PrescricaoAction::Update {
                medico,
                paciente,
                descricao,
            } => Response::from_outcome(
                "Prescricao",
                clinica
                    .prescricoes
                    .update(&medico, &paciente, &descricao)
                    .await,
            ),
        },
        Command::Schema => match ensure_schema(graph).await {
            Ok(()) => Response::ok("Constraints installed"),
            Err(e) => Response::from_error(&ClinicaError::from(e)),
        },
        Command::Ping => match verify_connectivity(graph).await {
            Ok(()) => Response::ok("Store reachable"),
            Err(e) => Response::from_error(&ClinicaError::from(e)),
        },
    };
    Ok(response)
}
