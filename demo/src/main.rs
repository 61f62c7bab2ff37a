use std::str::FromStr;

use nozomi_swap_client::config::{keypair_from_env, FlowConfig};
use nozomi_swap_client::quote::QuoteRequest;
use nozomi_swap_client::SwapFlow;
use solana_sdk::pubkey::Pubkey;

const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

// 0.1 SOL, 0.5% slippage
const SWAP_AMOUNT: u64 = 100_000_000;
const SLIPPAGE_BPS: u16 = 50;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = FlowConfig::from_env()?;
    let keypair = keypair_from_env()?;

    let input_mint = Pubkey::from_str(SOL_MINT)?;
    let output_mint = Pubkey::from_str(USDC_MINT)?;

    let flow = SwapFlow::new(config, keypair);
    println!("Swapping with wallet: {}", flow.signer_pubkey());

    // SOL to USDC, intermediate tokens restricted to the stable liquidity
    // set to keep slippage predictable.
    let request = QuoteRequest {
        input_mint,
        output_mint,
        amount: SWAP_AMOUNT,
        slippage_bps: SLIPPAGE_BPS,
        restrict_intermediate_tokens: true,
        ..Default::default()
    };

    let outcome = flow.execute(&request).await?;

    println!("Nozomi response: txid: {}", outcome.signature);
    println!("Explorer: https://solscan.io/tx/{}", outcome.signature);
    println!("Confirmed in: {:.3} seconds", outcome.confirmed_in.as_secs_f64());

    Ok(())
}
