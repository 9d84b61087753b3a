use clap::{Parser, Subcommand};
use fyl_core::CoreConfig;
use fyl_form::{ContactForm, Field, HttpTransport, SubmissionStatus};

#[derive(Parser)]
#[command(name = "fyl")]
#[command(about = "Practice contact form operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve configuration from the environment (and `.env`) and print it
    CheckConfig,
    /// Submit an appointment request to a running server
    Submit {
        /// Patient name
        name: String,
        /// Date of birth (YYYY-MM-DD)
        dob: String,
        /// Patient email
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        insurance: Option<String>,
        /// In-Person or Telehealth
        #[arg(long)]
        appointment_type: Option<String>,
        /// Email or Phone
        #[arg(long)]
        contact_method: Option<String>,
        #[arg(long)]
        message: Option<String>,
        /// Server base URL
        #[arg(long, default_value = "http://localhost:3000")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::CheckConfig) => match CoreConfig::from_env() {
            Ok(cfg) => {
                let limits = cfg.rate_limit();
                println!("Mode:            {}", cfg.mode());
                println!("Base URL:        {}", cfg.base_url());
                println!("Allowed host:    {}", cfg.allowed_hosts().canonical());
                println!("Sender:          {}", cfg.sender());
                println!("Practice inbox:  {}", cfg.practice_inbox());
                println!(
                    "Rate limit:      {} requests / {}s (unknown clients limited: {})",
                    limits.max_requests,
                    limits.window.as_secs(),
                    limits.limit_unknown_clients
                );
                println!("Practice:        {}", cfg.practice().name);
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                std::process::exit(1);
            }
        },
        Some(Commands::Submit {
            name,
            dob,
            email,
            phone,
            insurance,
            appointment_type,
            contact_method,
            message,
            url,
        }) => {
            let mut form = ContactForm::new();
            form.edit(Field::Name, name);
            form.edit(Field::Dob, dob);
            form.edit(Field::Email, email);
            let optional = [
                (Field::Phone, phone),
                (Field::Insurance, insurance),
                (Field::AppointmentType, appointment_type),
                (Field::ContactMethod, contact_method),
                (Field::Message, message),
            ];
            for (field, value) in optional {
                if let Some(value) = value {
                    form.edit(field, value);
                }
            }

            let transport = HttpTransport::new(&url);
            match form.submit(&transport).await {
                SubmissionStatus::Success => {
                    println!("{}", form.status_message().unwrap_or_default());
                }
                SubmissionStatus::Idle => {
                    for (field, error) in form.errors() {
                        eprintln!("{:?}: {}", field, error);
                    }
                    std::process::exit(2);
                }
                _ => {
                    eprintln!(
                        "Submission failed: {}",
                        form.status_message().unwrap_or_default()
                    );
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("Use 'fyl --help' for commands");
        }
    }

    Ok(())
}
