//! Stroke Dashboard - command line front end
//!
//! Every command is mapped to a dashboard route and goes through the same
//! route guard the web views use before it runs.

use stroke_dashboard::api::models::PatientInput;
use stroke_dashboard::auth::guard::{LANDING_PATH, LOGIN_PATH};
use stroke_dashboard::core::config::CliArgs;
use stroke_dashboard::core::{self, DashboardError, FileStorage, LocalStorage, Notification};
use stroke_dashboard::{
    ApiClient, AuthGateway, DashboardView, DiagnosisFlow, Navigation, Navigator, SessionContext,
    SessionStore,
};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "stroke-dashboard", version, about = "Stroke-risk clinical dashboard client")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
        /// Remember the username for the next sign-in
        #[arg(long)]
        remember: bool,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Patient records
    Patients {
        #[command(subcommand)]
        action: PatientsAction,
    },
    /// Consultation records
    Consultations {
        #[command(subcommand)]
        action: ConsultationsAction,
    },
    /// Upload images for analysis
    Diagnose {
        #[arg(long)]
        patient: String,
        /// Consultation date (YYYY-MM-DD), today when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = "")]
        notes: String,
        /// Also save the PDF report once the analysis is done
        #[arg(long)]
        report: bool,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Save the PDF report of a consultation
    Report {
        consultation_id: String,
        /// Defaults to the configured download directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Dashboard statistics
    Stats,
    /// List user accounts (admin only)
    Users,
}

#[derive(Debug, Subcommand)]
enum PatientsAction {
    List,
    Show { id: String },
    Create {
        name: String,
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        medical_history: Option<String>,
    },
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
enum ConsultationsAction {
    List {
        #[arg(long)]
        patient: Option<String>,
    },
    Show { id: String },
    Delete { id: String },
}

impl Command {
    /// Dashboard page this command stands in for
    fn route(&self) -> String {
        match self {
            Command::Login { .. } => LOGIN_PATH.to_string(),
            Command::Logout | Command::Whoami => LANDING_PATH.to_string(),
            Command::Patients { action } => match action {
                PatientsAction::Show { id } | PatientsAction::Delete { id } => format!("/patients/{}", id),
                _ => "/patients".to_string(),
            },
            Command::Consultations { action } => match action {
                ConsultationsAction::Show { id } | ConsultationsAction::Delete { id } => {
                    format!("/consultations/{}", id)
                }
                ConsultationsAction::List { .. } => "/consultations".to_string(),
            },
            Command::Diagnose { .. } => "/diagnosis".to_string(),
            Command::Report { consultation_id, .. } => format!("/consultations/{}", consultation_id),
            Command::Stats => "/statistics".to_string(),
            Command::Users => "/users".to_string(),
        }
    }
}

struct App {
    config: core::Config,
    api: ApiClient,
    session: Arc<SessionContext>,
    gateway: AuthGateway,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::Config::load(&cli.args) {
        Ok(cfg) => cfg,
        Err(e) => {
            // Print error to stderr since logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!(version = stroke_dashboard::VERSION, api = %config.api.base_url, "Starting stroke dashboard");

    let storage: Arc<dyn LocalStorage> = Arc::new(
        FileStorage::open(config.storage.storage_file())
            .with_context(|| format!("Failed to open local storage in {:?}", config.storage.data_dir))?,
    );
    let session = Arc::new(SessionContext::restored(SessionStore::new(storage)));
    let api = ApiClient::new(&config.api.base_url)?;
    let gateway = AuthGateway::new(api.clone(), session.clone(), config.build.mode.effective());

    let app = App {
        config,
        api,
        session,
        gateway,
    };

    if let Err(e) = app.dispatch(cli.command).await {
        let notice = match e.downcast_ref::<DashboardError>() {
            Some(err) => Notification::from_error(err),
            None => Notification::error(format!("{:#}", e)),
        };
        eprintln!("{}", notice);
        drop(logger);
        std::process::exit(1);
    }

    drop(logger);
    Ok(())
}

impl App {
    async fn dispatch(&self, command: Command) -> Result<()> {
        let mut navigator = Navigator::new(self.session.clone());
        if let Gate::Stop(notice) = gate(navigator.navigate(&command.route()), &self.session)? {
            println!("{}", notice);
            return Ok(());
        }

        match command {
            Command::Login { username, password, remember } => {
                let password = match password {
                    Some(p) => p,
                    None => read_password()?,
                };
                let identity = self.gateway.login(&username, &password, remember).await?;
                println!("{}", Notification::success(format!(
                    "Signed in as {} ({})",
                    identity.display_name(),
                    identity.role
                )));
            }
            Command::Logout => {
                self.gateway.logout()?;
                println!("{}", Notification::success("Signed out"));
            }
            Command::Whoami => {
                if let Some(identity) = self.session.current() {
                    println!(
                        "{} <{}> role={} id={}",
                        identity.display_name(),
                        identity.username,
                        identity.role,
                        identity.id
                    );
                }
            }
            Command::Patients { action } => self.patients(action).await?,
            Command::Consultations { action } => self.consultations(action).await?,
            Command::Diagnose { patient, date, notes, report, images } => {
                let flow = DiagnosisFlow::new(self.api.clone(), self.config.upload.max_image_bytes);
                flow.set_patient(patient);
                if let Some(date) = date {
                    flow.set_date(date);
                }
                flow.set_notes(notes);
                for notice in flow.add_image_paths(&images) {
                    eprintln!("{}", notice);
                }

                let result = flow.submit().await?;
                println!(
                    "Consultation {}: {} ({:.1}%)",
                    result.consultation_id,
                    result.diagnosis,
                    result.probability_percent()
                );
                for analysis in &result.image_analyses {
                    println!(
                        "  {}: {} (confidence {:.1}%)",
                        analysis.filename,
                        analysis.diagnosis,
                        analysis.confidence * 100.0
                    );
                }

                if report {
                    let path = flow
                        .download_report(&result.consultation_id, &self.config.storage.download_dir)
                        .await?;
                    println!("{}", Notification::success(format!("Report saved to {}", path.display())));
                }
            }
            Command::Report { consultation_id, dir } => {
                let flow = DiagnosisFlow::new(self.api.clone(), self.config.upload.max_image_bytes);
                let dir = dir.unwrap_or_else(|| self.config.storage.download_dir.clone());
                let path = flow.download_report(&consultation_id, &dir).await?;
                println!("{}", Notification::success(format!("Report saved to {}", path.display())));
            }
            Command::Stats => {
                let view = DashboardView::load(&self.api).await?;
                let summary = view.summary;
                println!("Patients:       {}", summary.total_patients);
                println!("Consultations:  {}", summary.total_consultations);
                println!("Stroke cases:   {}", summary.stroke_cases);
                println!("Normal cases:   {}", summary.normal_cases);
                println!("Stroke rate:    {:.1}%", summary.stroke_rate());

                println!("\nDiagnosis distribution");
                for ((label, value), pct) in view
                    .distribution
                    .labels
                    .iter()
                    .zip(&view.distribution.values)
                    .zip(&view.distribution.percentages)
                {
                    println!("  {:<16} {:>5} {:>6.1}%", label, value, pct);
                }

                println!("\nConsultations per month");
                for (month, count) in view.trend.labels.iter().zip(&view.trend.values) {
                    println!("  {:<16} {:>5}", month, count);
                }
            }
            Command::Users => {
                for user in self.api.list_users().await? {
                    println!("{:>6}  {:<16} {:<24} {}", user.id, user.username, user.full_name, user.role);
                }
            }
        }

        Ok(())
    }

    async fn patients(&self, action: PatientsAction) -> Result<()> {
        match action {
            PatientsAction::List => {
                for patient in self.api.list_patients().await? {
                    println!(
                        "{:>6}  {:<28} {}",
                        patient.id,
                        patient.name,
                        patient.gender.as_deref().unwrap_or("-")
                    );
                }
            }
            PatientsAction::Show { id } => {
                let patient = self.api.get_patient(&id).await?;
                println!("{}", serde_json::to_string_pretty(&patient)?);
            }
            PatientsAction::Create {
                name,
                date_of_birth,
                gender,
                phone,
                email,
                address,
                medical_history,
            } => {
                let input = PatientInput {
                    name,
                    date_of_birth,
                    gender,
                    phone,
                    email,
                    address,
                    medical_history,
                };
                let patient = self.api.create_patient(&input).await?;
                println!("{}", Notification::success(format!("Patient {} created", patient.id)));
            }
            PatientsAction::Delete { id } => {
                self.api.delete_patient(&id).await?;
                println!("{}", Notification::success(format!("Patient {} deleted", id)));
            }
        }
        Ok(())
    }

    async fn consultations(&self, action: ConsultationsAction) -> Result<()> {
        match action {
            ConsultationsAction::List { patient } => {
                for c in self.api.list_consultations(patient.as_deref()).await? {
                    println!(
                        "{:>6}  {:<12} {:<24} {}",
                        c.id,
                        c.date.as_deref().unwrap_or("-"),
                        c.patient_name.as_deref().unwrap_or(&c.patient_id),
                        c.diagnosis.as_deref().unwrap_or("pending")
                    );
                }
            }
            ConsultationsAction::Show { id } => {
                let consultation = self.api.get_consultation(&id).await?;
                println!("{}", serde_json::to_string_pretty(&consultation)?);
            }
            ConsultationsAction::Delete { id } => {
                self.api.delete_consultation(&id).await?;
                println!("{}", Notification::success(format!("Consultation {} deleted", id)));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
enum Gate {
    Proceed,
    /// Nothing to do, but nothing went wrong either
    Stop(Notification),
}

/// Turn the guard's verdict into whether the command runs.
///
/// Being sent to the login page or shown the access-denied view is an error
/// so the process exits non-zero.
fn gate(navigation: Navigation, session: &SessionContext) -> Result<Gate> {
    match navigation {
        Navigation::Render { .. } => Ok(Gate::Proceed),
        Navigation::Redirect { to, from } if to == LOGIN_PATH => {
            Err(DashboardError::Authentication(format!(
                "Please sign in to view {} (stroke-dashboard login <username>)",
                from.unwrap_or_default()
            ))
            .into())
        }
        Navigation::Redirect { .. } => {
            let name = session
                .current()
                .map(|identity| identity.display_name().to_string())
                .unwrap_or_default();
            Ok(Gate::Stop(Notification::info(format!(
                "Already signed in as {}; log out first to switch accounts",
                name
            ))))
        }
        Navigation::AccessDenied(denied) => Err(DashboardError::Authentication(format!(
            "{}: {} ({}: stroke-dashboard whoami)",
            denied.title, denied.message, denied.back_label
        ))
        .into()),
        Navigation::NotFound { path } => anyhow::bail!("No page at {}", path),
        Navigation::Loading => anyhow::bail!("Session is still being restored"),
    }
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use stroke_dashboard::auth::guard::AccessDenied;
    use stroke_dashboard::core::MemoryStorage;

    fn signed_out() -> SessionContext {
        SessionContext::restored(SessionStore::new(Arc::new(MemoryStorage::new())))
    }

    #[test]
    fn test_login_redirect_is_an_error() {
        let session = signed_out();
        let mut navigator = Navigator::new(Arc::new(signed_out()));
        let err = gate(navigator.navigate("/patients"), &session).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DashboardError>(),
            Some(DashboardError::Authentication(_))
        ));
    }

    #[test]
    fn test_access_denied_is_an_error() {
        let denied = AccessDenied {
            title: "Access denied".into(),
            message: "You do not have permission to view /users.".into(),
            back_label: "Back to dashboard".into(),
            back_to: LANDING_PATH.into(),
        };
        let err = gate(Navigation::AccessDenied(denied), &signed_out()).unwrap_err();
        let notice = Notification::from_error(err.downcast_ref::<DashboardError>().unwrap());
        assert!(notice.message.starts_with("Access denied"));
    }

    #[test]
    fn test_render_proceeds() {
        let nav = Navigation::Render { path: "/login".into(), title: "Sign in" };
        assert!(matches!(gate(nav, &signed_out()).unwrap(), Gate::Proceed));
    }

    #[test]
    fn test_route_mapping() {
        let cmd = Command::Report { consultation_id: "11".into(), dir: None };
        assert_eq!(cmd.route(), "/consultations/11");
        assert_eq!(Command::Users.route(), "/users");
    }
}
