//! Locate the current coordinator of a group.

pub mod request;
pub mod response;

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use nombytes::NomBytes;

    use super::*;
    use crate::{
        encode::ToByte,
        error::{Error, KafkaCode},
        network::BrokerAddress,
        protocol,
    };

    #[test]
    fn encode() {
        let b = [
            0, 10, 0, 0, 0, 0, 0, 1, 0, 4, 114, 117, 115, 116, 0, 8, 66, 105, 103, 32, 68, 111,
            103, 115,
        ];
        let correlation_id = 1;
        let client_id = "rust";
        let consumer_group_key = "Big Dogs";

        let req =
            request::FindCoordinatorRequest::new(correlation_id, client_id, consumer_group_key);

        let mut buffer: Vec<u8> = vec![];

        req.encode(&mut buffer).unwrap();

        assert_eq!(buffer, b);
    }

    #[test]
    fn parse() {
        let b = b"\0\0\0\x01\0\0\0\0\0\x01\0\tlocalhost\0\0#\x84";

        let res = response::FindCoordinatorResponse {
            header: protocol::HeaderResponse { correlation_id: 1 },
            error_code: KafkaCode::None,
            node_id: 1,
            host: Bytes::from_static(b"localhost"),
            port: 9092,
        };

        let x = response::parse_find_coordinator_response(NomBytes::new(Bytes::from_static(b)))
            .unwrap()
            .1;

        assert_eq!(res, x);
        assert!(x.is_error().is_ok());
        assert_eq!(
            x.coordinator_addr().unwrap(),
            BrokerAddress {
                host: "localhost".to_owned(),
                port: 9092
            }
        );
    }

    #[test]
    fn coordinator_not_available() {
        let b = b"\0\0\0\x02\0\x0f\xff\xff\xff\xff\0\0\xff\xff\xff\xff";

        let x = response::FindCoordinatorResponse::try_from(Bytes::from_static(b)).unwrap();

        assert_eq!(x.error_code, KafkaCode::CoordinatorNotAvailable);
        assert_eq!(
            x.is_error(),
            Err(Error::KafkaError(KafkaCode::CoordinatorNotAvailable))
        );
        assert!(x.coordinator_addr().is_err());
    }

    #[test]
    fn truncated_response() {
        let b = Bytes::from_static(b"\0\0\0\x01\0\0\0\0");

        assert_eq!(
            response::FindCoordinatorResponse::try_from(b.clone()),
            Err(Error::ParsingError(b))
        );
    }
}
