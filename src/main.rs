use clap::{Parser, Subcommand};
use crowdfund_sync::artifact;
use crowdfund_sync::campaign::{Address, Campaign, NATIVE_TOKEN_DECIMALS};
use crowdfund_sync::config::AppConfig;
use crowdfund_sync::store::{JsonRpcCampaignStore, JsonRpcClient, StoreConnection};
use crowdfund_sync::sync::events::{LogNoticeHandler, Notice, NoticeDispatcher, NoticeHandler};
use crowdfund_sync::sync::view::{
	CampaignSummary, DaysLeft, FundingPanel, NO_DONATORS, REWARD_NOT_SET,
};
use crowdfund_sync::sync::{
	CampaignDetailSynchronizer, CampaignDetailView, CampaignListSynchronizer, LoadOutcome,
	SyncContext, SyncError,
};
use crowdfund_sync::transaction::sender::JsonRpcSubmitter;
use crowdfund_sync::utils::format_token_amount;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "crowdfund-sync")]
#[command(about = "Browse crowdfunding campaigns and donate to them", long_about = None)]
struct Args {
	/// JSON-RPC endpoint of the node
	#[arg(long, global = true)]
	rpc_url: Option<String>,

	/// Address of the campaign contract
	#[arg(long, global = true)]
	contract: Option<String>,

	/// Node-managed account to donate from
	#[arg(long, global = true)]
	account: Option<String>,

	/// Receipt polling interval in milliseconds
	#[arg(long, global = true)]
	poll_interval_ms: Option<u64>,

	/// Seconds to wait for a donation to be confirmed
	#[arg(long, global = true)]
	confirmation_timeout: Option<u64>,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// List every campaign
	Campaigns,

	/// Show one campaign with its donators
	Show {
		/// Campaign id
		id: u64,
	},

	/// Donate to a campaign
	Donate {
		/// Campaign id
		id: u64,
		/// Amount in whole currency units, e.g. 0.5
		amount: String,
	},

	/// Compile the campaign contract into ABI and bytecode artifacts
	Compile {
		/// Directory holding Campaign.sol
		#[arg(long)]
		contracts_dir: Option<PathBuf>,
		/// Output directory, replaced on every run
		#[arg(long)]
		build_dir: Option<PathBuf>,
		/// Solidity compiler executable
		#[arg(long, default_value = "solc")]
		solc: String,
	},
}

impl Args {
	fn apply(&self, mut config: AppConfig) -> AppConfig {
		if let Some(url) = &self.rpc_url {
			config.rpc_url = url.clone();
		}
		if let Some(contract) = &self.contract {
			config.contract = Address::new(contract.as_str());
		}
		if let Some(account) = &self.account {
			config.account = Some(Address::new(account.as_str()));
		}
		if let Some(ms) = self.poll_interval_ms {
			config.poll_interval = Duration::from_millis(ms);
		}
		if let Some(secs) = self.confirmation_timeout {
			config.confirmation_timeout = Duration::from_secs(secs);
		}
		config
	}
}

/// Prints notices to the terminal as they arrive.
struct TerminalNotices;

#[async_trait::async_trait]
impl NoticeHandler for TerminalNotices {
	async fn handle(&self, notice: &Notice) -> Result<(), SyncError> {
		match &notice.reference {
			Some(reference) => println!("{} ({})", notice.message, reference),
			None => println!("{}", notice.message),
		}
		Ok(())
	}

	fn name(&self) -> &'static str {
		"TerminalNotices"
	}
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::builder()
				.with_default_directive(tracing::Level::WARN.into())
				.from_env_lossy(),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	if let Err(e) = run(Args::parse()).await {
		error!("{}", e);
		eprintln!("Error: {}", e);
		std::process::exit(1);
	}
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
	let config = args.apply(AppConfig::from_env()?);

	match args.command {
		Commands::Campaigns => list_campaigns(&config).await,
		Commands::Show { id } => show_campaign(&config, id).await,
		Commands::Donate { id, ref amount } => donate(&config, id, amount).await,
		Commands::Compile {
			ref contracts_dir,
			ref build_dir,
			ref solc,
		} => {
			let contracts_dir = contracts_dir.as_ref().unwrap_or(&config.contracts_dir);
			let build_dir = build_dir.as_ref().unwrap_or(&config.build_dir);
			let path = artifact::compile_contracts(contracts_dir, build_dir, solc).await?;
			println!("Build directory created: {}", path.display());
			Ok(())
		}
	}
}

fn context(config: &AppConfig) -> Result<SyncContext, Box<dyn Error>> {
	let rpc = JsonRpcClient::new(config.rpc_url.clone(), config.request_timeout)?;
	info!("Using node {} and contract {}", rpc.url(), config.contract);

	let store = JsonRpcCampaignStore::new(rpc.clone(), config.contract.clone());
	let submitter = JsonRpcSubmitter::new(
		rpc,
		config.contract.clone(),
		config.poll_interval,
		config.confirmation_timeout,
	);

	let mut notices = NoticeDispatcher::new();
	notices.register_handler(Arc::new(LogNoticeHandler));
	notices.register_handler(Arc::new(TerminalNotices));

	Ok(SyncContext::new(
		StoreConnection::ready(Arc::new(store)),
		Arc::new(submitter),
		notices,
	))
}

async fn fetch_campaigns(ctx: &SyncContext) -> Result<Vec<Campaign>, Box<dyn Error>> {
	let mut list = CampaignListSynchronizer::new(ctx.clone());
	match list.refresh().await {
		LoadOutcome::Failed(e) => Err(e.into()),
		_ => Ok(list.view().campaigns),
	}
}

async fn open_campaign(
	ctx: &SyncContext,
	id: u64,
) -> Result<CampaignDetailSynchronizer, Box<dyn Error>> {
	let campaign = fetch_campaigns(ctx)
		.await?
		.into_iter()
		.find(|c| c.id == id)
		.ok_or_else(|| format!("Campaign {} does not exist", id))?;

	let detail = CampaignDetailSynchronizer::new(ctx.clone(), campaign);
	detail.refresh_donors().await;
	Ok(detail)
}

async fn list_campaigns(config: &AppConfig) -> Result<(), Box<dyn Error>> {
	let ctx = context(config)?;
	let campaigns = fetch_campaigns(&ctx).await?;
	if campaigns.is_empty() {
		println!("No campaigns yet");
		return Ok(());
	}

	let now = ctx.clock.now();
	for campaign in &campaigns {
		let summary = CampaignSummary::derive(campaign, now);
		println!(
			"#{:<3} {:<32} {:>12} / {:<12} {:>3}%  {}",
			campaign.id,
			campaign.title,
			amount(campaign.amount_collected),
			amount(campaign.target),
			summary.bar_percentage,
			days_left(summary.days_left),
		);
	}
	Ok(())
}

async fn show_campaign(config: &AppConfig, id: u64) -> Result<(), Box<dyn Error>> {
	let ctx = context(config)?;
	let detail = open_campaign(&ctx, id).await?;
	render(&detail.view());
	Ok(())
}

async fn donate(config: &AppConfig, id: u64, value: &str) -> Result<(), Box<dyn Error>> {
	let donor = config
		.account
		.clone()
		.ok_or("No account to donate from; pass --account or set CROWDFUND_ACCOUNT")?;
	let ctx = context(config)?;
	let detail = open_campaign(&ctx, id).await?;
	if !detail.can_donate() {
		return Err(format!("Campaign {} is not accepting donations", id).into());
	}

	let owner = detail.view().campaign.owner;
	detail.donate(value, donor, owner).await?;
	detail.settle_donors().await;
	render(&detail.view());
	Ok(())
}

fn render(view: &CampaignDetailView) {
	let campaign = &view.campaign;
	let summary = &view.summary;

	println!("{}", campaign.title);
	println!("{}", campaign.image);
	println!();
	println!("Days left:  {}", days_left(summary.days_left));
	println!(
		"Raised:     {} of {} ({}%)",
		amount(campaign.amount_collected),
		amount(campaign.target),
		summary.bar_percentage
	);
	println!("Backers:    {}", view.backers());
	println!("Creator:    {}", campaign.owner);
	println!();
	println!("{}", campaign.description);
	println!();
	println!("Reward: {}", REWARD_NOT_SET);
	println!();
	println!("Donators");
	if view.has_donors() {
		for (index, donation) in view.donors.iter().enumerate() {
			println!("  {}. {}  {}", index + 1, donation.donor, amount(donation.amount));
		}
	} else {
		println!("  {}", NO_DONATORS);
	}
	println!();
	match summary.funding {
		FundingPanel::Open => {
			println!("Fund the campaign: crowdfund-sync donate {} <amount>", campaign.id)
		}
		FundingPanel::Ended { amount_collected } => {
			println!("Campaign ended with {} Donation.", amount(amount_collected))
		}
	}
}

fn amount(value: u128) -> String {
	format_token_amount(value, NATIVE_TOKEN_DECIMALS)
}

fn days_left(days: DaysLeft) -> String {
	match days {
		DaysLeft::Remaining(days) => days.to_string(),
		DaysLeft::Ended => "Ended".to_string(),
	}
}
