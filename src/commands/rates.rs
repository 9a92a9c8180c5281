use crate::api::{self, Desk, Mode};
use crate::commands::Out;
use crate::model::RateConfig;
use crate::{Config, Result};

/// Shows the default buy and sell rates. Falls back to the built-in rates when the `Tasas` tab
/// cannot be read.
pub async fn rates(config: Config, mode: Mode) -> Result<Out<RateConfig>> {
    let sheet = api::sheet(&config, mode).await?;
    let mut desk = Desk::new(sheet, config.ledger_tab());
    let rates = desk.rates().await;
    Ok(Out::new(
        format!(
            "Buy (Compra): {}, sell (Venta): {}",
            rates.buy_rate(),
            rates.sell_rate()
        ),
        rates,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TASAS;
    use crate::model::{DEFAULT_BUY_RATE, DEFAULT_SELL_RATE};
    use crate::test::TestEnv;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[tokio::test]
    async fn test_rates() {
        let env = TestEnv::new().await;
        let out = rates(env.config(), Mode::Test).await.unwrap();
        let rates = out.structure().unwrap();
        assert_eq!(rates.buy_rate(), Decimal::from_str("18.70").unwrap());
        assert_eq!(rates.sell_rate(), Decimal::from_str("19.30").unwrap());
        assert_eq!(out.message(), "Buy (Compra): 18.70, sell (Venta): 19.30");
    }

    #[tokio::test]
    async fn test_missing_rates_use_defaults() {
        let env = TestEnv::new().await;
        let mut state = env.get_state();
        state.tabs.remove(TASAS);
        env.set_state(state);
        let out = rates(env.config(), Mode::Test).await.unwrap();
        let rates = out.structure().unwrap();
        assert_eq!(rates.buy_rate(), DEFAULT_BUY_RATE);
        assert_eq!(rates.sell_rate(), DEFAULT_SELL_RATE);
    }
}
