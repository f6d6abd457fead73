//! Rolegate 운영자 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 해시 생성 (비밀번호는 stdin에서 읽음)
//! echo -n 's3cret' | rolegate hash-password
//!
//! # 사용자 추가/역할 변경
//! rolegate add-user -u alice -r admin --password s3cret
//!
//! # 토큰 발급 후 검증
//! SECRET_KEY=... ALGORITHM=HS256 rolegate login -v -u alice --password s3cret
//! SECRET_KEY=... ALGORITHM=HS256 rolegate verify-token eyJhbGciOi...
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use rolegate_cli::commands::token::{login, verify_token};
use rolegate_cli::commands::users::{add_user, hash, read_password, AddUserConfig};
use rolegate_core::{init_logging_to, AppConfig, AuthSettings, LogTarget, LoggingConfig};

#[derive(Parser)]
#[command(name = "rolegate")]
#[command(about = "Rolegate CLI - 사용자 및 토큰 관리 도구", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 경로
    #[arg(
        short,
        long,
        global = true,
        env = "ROLEGATE_CONFIG",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    /// 진행 로그(info)를 stderr에 출력. `RUST_LOG`가 있으면 그쪽이 우선
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 비밀번호를 Argon2id PHC 문자열로 해싱
    HashPassword {
        /// 평문 비밀번호 (생략하면 stdin 첫 줄)
        #[arg(long)]
        password: Option<String>,
    },

    /// 사용자 파일에 사용자 추가 또는 교체
    AddUser {
        /// 사용자 이름
        #[arg(short, long)]
        username: String,

        /// 역할 (예: admin, moderator, viewer)
        #[arg(short, long)]
        role: String,

        /// 평문 비밀번호 (생략하면 stdin 첫 줄)
        #[arg(long)]
        password: Option<String>,

        /// 사용자 파일 경로 (기본: 설정의 auth.users_file)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// 로그인하여 토큰 응답 JSON 출력
    Login {
        /// 사용자 이름
        #[arg(short, long)]
        username: String,

        /// 평문 비밀번호 (생략하면 stdin 첫 줄)
        #[arg(long)]
        password: Option<String>,
    },

    /// 토큰을 검증하여 신원 또는 거부 사유 출력
    VerifyToken {
        /// Bearer 토큰 문자열
        token: String,
    },
}

/// CLI 로그 레벨. 명령 결과를 가리지 않도록 기본은 warn.
fn cli_log_level(verbose: bool) -> &'static str {
    if verbose {
        "info"
    } else {
        "warn"
    }
}

/// CLI 로깅. stdout은 명령 결과 전용이므로 stderr로 보냅니다.
fn init_cli_logging(config: &AppConfig, verbose: bool) -> Result<()> {
    let logging = LoggingConfig {
        level: cli_log_level(verbose).to_string(),
        format: config.logging.format.clone(),
    };
    init_logging_to(&logging, LogTarget::Stderr)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

fn auth_settings(config: &AppConfig) -> Result<AuthSettings> {
    config
        .auth
        .settings()
        .context("Invalid authentication configuration (SECRET_KEY, ALGORITHM 확인)")
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    init_cli_logging(&config, cli.verbose)?;

    match cli.command {
        Commands::HashPassword { password } => {
            let password = read_password(password, io::stdin().lock())?;
            println!("{}", hash(&password)?);
        }

        Commands::AddUser {
            username,
            role,
            password,
            file,
        } => {
            let password = read_password(password, io::stdin().lock())?;
            let file = file.unwrap_or_else(|| config.auth.users_file.clone());
            let user_config = AddUserConfig {
                username: username.clone(),
                role: role.clone(),
                password,
                file: file.clone(),
            };

            let replaced = add_user(user_config).await?;
            let action = if replaced { "갱신" } else { "추가" };
            println!("사용자 {}: {} ({})", action, username, role);
            println!("저장 위치: {}", file.display());
        }

        Commands::Login { username, password } => {
            let settings = auth_settings(&config)?;
            let password = read_password(password, io::stdin().lock())?;

            match login(&settings, &username, &password).await {
                Ok(issued) => {
                    info!(username = %username, "Token issued");
                    println!("{}", serde_json::to_string_pretty(&issued)?);
                }
                Err(e) => {
                    error!(username = %username, reason = e.reason(), "Login failed");
                    return Err(anyhow!(e));
                }
            }
        }

        Commands::VerifyToken { token } => {
            let settings = auth_settings(&config)?;

            match verify_token(&settings, &token) {
                Ok(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
                Err(e) => bail!("Token rejected: {} ({})", e.reason(), e),
            }
        }
    }

    Ok(())
}
