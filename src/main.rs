//! SurveyDesk CLI - drives the stores and the router from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use surveydesk::app::App;
use surveydesk::config::AppConfig;
use surveydesk::router::Decision;
use surveydesk::state::models::{NewCompany, NewRespondent, OAuthProvider};
use surveydesk::state::{normalize, FormResponse};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "surveydesk", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Navigate to a path through the guard and print where it lands
    Route { path: String },
    Login { email: String, password: String },
    Register { email: String, password: String },
    /// Send a one-time sign-in link
    MagicLink { email: String },
    /// Print the Google sign-in URL
    Oauth,
    ResetPassword { email: String },
    Logout,
    /// Create the signed-in user's company
    RegisterBusiness {
        name: String,
        email: String,
        phone: String,
    },
    /// Print the company's invite link
    InviteLink,
    AcceptInvite { token: String },
    /// Print recent surveys and counters
    Surveys,
    /// Register a respondent and open a pending response
    Interview {
        survey_id: String,
        first_name: String,
        last_name: String,
        address: String,
    },
    /// Print an empty answer form for a survey as JSON
    Form { survey_id: String },
    /// Submit a filled answer form (JSON) for a response
    Submit { response_id: String, form: PathBuf },
    /// Print the answer records a form would produce, without submitting
    Normalize { response_id: String, form: PathBuf },
}

fn read_form(path: &Path) -> Result<FormResponse> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading form {}", path.display()))?;
    Ok(serde_json::from_str(&content)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surveydesk=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    if let Command::Normalize { response_id, form } = &cli.command {
        let records = normalize(&read_form(form)?, response_id);
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let mut app = App::new(AppConfig::load()?)?;
    if let Err(err) = run(&mut app, cli.command).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(app: &mut App, command: Command) -> Result<()> {
    match command {
        Command::Route { path } => {
            let decision = app.navigate(&path).await?;
            match (&decision, app.location()) {
                (Decision::Fail(reason), _) => anyhow::bail!("{reason}"),
                (_, Some(location)) => println!("{location}"),
                (_, None) => println!("nowhere"),
            }
        }
        Command::Login { email, password } => {
            app.login(&email, &password).await?;
            println!("signed in as {email}");
        }
        Command::Register { email, password } => {
            if app.register(&email, &password).await? {
                println!("registered and signed in as {email}");
            } else {
                println!("check {email} to confirm the account");
            }
        }
        Command::MagicLink { email } => {
            app.send_magic_link(&email).await?;
            println!("sign-in link sent to {email}");
        }
        Command::Oauth => println!("{}", app.oauth_url(OAuthProvider::Google)?),
        Command::ResetPassword { email } => {
            app.reset_password(&email).await?;
            println!("password reset sent to {email}");
        }
        Command::Logout => {
            app.logout().await?;
            println!("signed out");
        }
        Command::RegisterBusiness { name, email, phone } => {
            app.enter("/start").await?;
            app.register_business(NewCompany { name, email, phone })
                .await?;
            println!("company created");
        }
        Command::InviteLink => {
            app.enter("/settings").await?;
            println!("/start/invite/{}", app.invite_token().await?);
        }
        Command::AcceptInvite { token } => {
            app.accept_invite(&token).await?;
            println!("joined company");
        }
        Command::Surveys => {
            app.enter("/surveys").await?;
            app.load_overview().await?;
            let surveys = &app.state.surveys;
            println!(
                "surveys: {} created, {} published, {} unpublished, {} responses",
                surveys.created_count.unwrap_or_default(),
                surveys.published_count.unwrap_or_default(),
                surveys.unpublished_count.unwrap_or_default(),
                app.state.responses.responses_count.unwrap_or_default(),
            );
            for summary in &surveys.surveys {
                let status = summary
                    .survey_status
                    .as_ref()
                    .map(|s| s.title.as_str())
                    .unwrap_or("-");
                println!("{}  {}  [{}]", summary.survey.id, summary.survey.title, status);
            }
        }
        Command::Interview {
            survey_id,
            first_name,
            last_name,
            address,
        } => {
            let response = app
                .start_interview(
                    &survey_id,
                    NewRespondent {
                        first_name,
                        last_name,
                        address,
                        ..Default::default()
                    },
                )
                .await?;
            println!("/ask/{}/{}", response.survey_id, response.respondent_id);
            println!("response {}", response.id);
        }
        Command::Form { survey_id } => {
            let form = app.open_form(&survey_id).await?;
            println!("{}", serde_json::to_string_pretty(&form)?);
        }
        Command::Submit { response_id, form } => {
            app.submit_response(&response_id, &read_form(&form)?)
                .await?;
            println!("response {response_id} completed");
        }
        // handled before the app is built
        Command::Normalize { .. } => {}
    }
    Ok(())
}
