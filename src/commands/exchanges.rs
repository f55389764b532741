use super::{connect, fail, runtime};

pub fn run() {
    let rt = runtime();

    rt.block_on(async {
        let fetcher = match connect(None).await {
            Ok(f) => f,
            Err(e) => fail(&e, "configured exchanges", "exchange list"),
        };

        println!("Available Exchanges:");
        for exchange in fetcher.available_exchanges() {
            println!("  • {}", exchange);
        }

        let failures = fetcher.registry().failures();
        if !failures.is_empty() {
            println!();
            for (exchange, reason) in failures {
                println!("⚠️  {} unavailable: {}", exchange, reason);
            }
        }
    });
}
