use super::{connect, fail, runtime};

pub fn run(exchange: String, symbol: String) {
    let rt = runtime();

    rt.block_on(async {
        let fetcher = match connect(Some(&exchange)).await {
            Ok(f) => f,
            Err(e) => fail(&e, &exchange, &symbol),
        };

        match fetcher.validate_symbol(&exchange, &symbol) {
            Ok(true) => println!("✅ {} is available on {}", symbol, exchange),
            Ok(false) => {
                let base = symbol.split('/').next().unwrap_or(&symbol);
                println!("❌ {} is not available on {}", symbol, exchange);
                println!(
                    "💡 Try: crypto-fetcher symbols --exchange {} --search {}",
                    exchange, base
                );
            }
            Err(e) => fail(&e, &exchange, &symbol),
        }
    });
}
