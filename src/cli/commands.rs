use crate::cli::args::{AccountArgs, Commands, InvokeArgs, PayArgs, SmokeArgs, TxArgs};
use crate::cli::output::{CommandOutput, SmokeReport};
use crate::client::Connector;
use crate::output::Formatter;
use crate::xdr::ArgumentParser;
use crate::{LedgerOrchestrator, PaymentRequest};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::Write;

fn print_info(message: impl AsRef<str>) {
    eprintln!("{}", Formatter::info(message));
}

fn print_success(message: impl AsRef<str>) {
    eprintln!("{}", Formatter::success(message));
}

fn print_warning(message: impl AsRef<str>) {
    eprintln!("{}", Formatter::warning(message));
}

fn print_json<T: Serialize>(command: &'static str, result: T) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &CommandOutput::success(command, result))
        .into_diagnostic()?;
    writeln!(stdout).into_diagnostic()
}

/// Dispatch a parsed subcommand.
pub async fn execute<C: Connector>(command: Commands, orchestrator: &LedgerOrchestrator<C>) -> Result<()> {
    match command {
        Commands::Wallet => wallet(orchestrator),
        Commands::Fund(args) => fund(args, orchestrator).await,
        Commands::Balance(args) => balance(args, orchestrator).await,
        Commands::Tx(args) => transaction(args, orchestrator).await,
        Commands::Pay(args) => pay(args, orchestrator).await,
        Commands::Invoke(args) => invoke(args, orchestrator).await,
        Commands::Smoke(args) => smoke(args, orchestrator).await,
    }
}

fn wallet<C: Connector>(orchestrator: &LedgerOrchestrator<C>) -> Result<()> {
    let wallet = orchestrator.create_wallet();
    print_warning("The secret key is not stored anywhere. Save it now.");
    print_json("wallet", wallet)
}

async fn fund<C: Connector>(args: AccountArgs, orchestrator: &LedgerOrchestrator<C>) -> Result<()> {
    print_info(format!("Funding {}", args.public_key));
    let response = orchestrator.fund_testnet_wallet(&args.public_key).await?;
    print_success("Account funded");
    print_json("fund", response)
}

async fn balance<C: Connector>(args: AccountArgs, orchestrator: &LedgerOrchestrator<C>) -> Result<()> {
    let balance = orchestrator.get_balance(&args.public_key).await?;
    print_json(
        "balance",
        serde_json::json!({ "public_key": args.public_key, "balance": balance }),
    )
}

async fn transaction<C: Connector>(args: TxArgs, orchestrator: &LedgerOrchestrator<C>) -> Result<()> {
    let record = orchestrator.get_transaction(&args.hash).await?;
    print_json("tx", record)
}

async fn pay<C: Connector>(args: PayArgs, orchestrator: &LedgerOrchestrator<C>) -> Result<()> {
    let mut request = PaymentRequest::new(args.source_secret, args.destination, args.amount);
    request.memo = args.memo;

    print_info(format!("Sending {} XLM to {}", request.amount, request.destination));
    let result = orchestrator.send_transaction(&request).await?;
    print_success(format!("Payment included in ledger {}", result.ledger));
    print_json("pay", result)
}

async fn invoke<C: Connector>(args: InvokeArgs, orchestrator: &LedgerOrchestrator<C>) -> Result<()> {
    let call_args = match &args.args {
        Some(json) => ArgumentParser::new()
            .parse_args_string(json)
            .map_err(crate::LedgerError::from)?,
        None => Vec::new(),
    };

    print_info(format!("Invoking {}", args.method));
    let result = orchestrator.invoke_contract(&args.method, call_args).await?;
    print_success("Invocation confirmed");
    print_json("invoke", result)
}

async fn smoke<C: Connector>(args: SmokeArgs, orchestrator: &LedgerOrchestrator<C>) -> Result<()> {
    let wallet = orchestrator.create_wallet();
    print_info(format!("Wallet: {}", wallet.public_key));

    let funded = if args.skip_fund {
        print_warning("Skipping faucet");
        false
    } else {
        orchestrator.fund_testnet_wallet(&wallet.public_key).await?;
        print_success("Funded");
        true
    };

    let balance = orchestrator.get_balance(&wallet.public_key).await?;
    print_info(format!("Balance: {balance}"));

    let call = orchestrator.invoke_contract(&args.method, Vec::new()).await?;
    print_success(format!("Contract result: {}", call.result));

    print_json(
        "smoke",
        SmokeReport {
            public_key: wallet.public_key,
            funded,
            balance,
            contract_result: call.result,
        },
    )
}
