use samsa_groups::prelude::{BrokerAddress, Error};
use std::env;

const KAFKA_BROKERS: &str = "KAFKA_BROKERS";

pub fn get_brokers() -> Result<(bool, Vec<BrokerAddress>), Error> {
    let brokers = match env::var(KAFKA_BROKERS) {
        Ok(brokers) => brokers
            .split(',')
            .map(str::parse)
            .collect::<Result<Vec<BrokerAddress>, Error>>()?,
        Err(_) => {
            tracing::warn!("Skipping test because no {} is set", KAFKA_BROKERS);
            return Ok((true, vec![]));
        }
    };
    Ok((false, brokers))
}
