use crate::api::{self, Desk, Mode};
use crate::commands::Out;
use crate::model::{Amount, Clients};
use crate::{Config, Result};

/// Lists the roster with the USDT and MXN balance of every client. An unreadable roster is
/// reported as empty.
pub async fn clients(config: Config, mode: Mode) -> Result<Out<Clients>> {
    let sheet = api::sheet(&config, mode).await?;
    let mut desk = Desk::new(sheet, config.ledger_tab());
    let clients = desk.clients().await;
    if clients.is_empty() {
        return Ok(Out::new("There are no clients in the roster", clients));
    }

    let mut message = format!("{} clients:", clients.len());
    for client in clients.iter() {
        message.push_str(&format!(
            "\n  {}: {} USDT, {} MXN",
            client.alias(),
            Amount::plain(client.balance_usdt()),
            Amount::plain(client.balance_mxn())
        ));
    }
    Ok(Out::new(message, clients))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CLIENTES;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_clients() {
        let env = TestEnv::new().await;
        let out = clients(env.config(), Mode::Test).await.unwrap();
        assert_eq!(out.structure().unwrap().len(), 3);
        assert!(out.message().contains("Maria Lopez: -25.50 USDT, 1,200.00 MXN"));
    }

    #[tokio::test]
    async fn test_missing_roster() {
        let env = TestEnv::new().await;
        let mut state = env.get_state();
        state.tabs.remove(CLIENTES);
        env.set_state(state);
        let out = clients(env.config(), Mode::Test).await.unwrap();
        assert!(out.structure().unwrap().is_empty());
        assert_eq!(out.message(), "There are no clients in the roster");
    }
}
