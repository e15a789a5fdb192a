mod testsupport;

use samsa_groups::prelude::{
    find_coordinator, protocol, BrokerConnection, ClusterBuilder, Error, KafkaCode,
    TcpConnection,
};
use tokio_util::sync::CancellationToken;

const CLIENT_ID: &str = "describe groups integration test";
const CORRELATION_ID: i32 = 1;
const GROUP_ID: &str = "describe groups integration test";
const GROUP_ID2: &str = "describe groups integration test 2";

#[tokio::test]
async fn it_can_find_and_query_a_coordinator() -> Result<(), Box<Error>> {
    let (skip, brokers) = testsupport::get_brokers()?;
    if skip {
        return Ok(());
    }
    let mut conn = TcpConnection::new(brokers).await?;

    //
    // Get coordinator for this group
    //
    let coordinator_res = find_coordinator(&mut conn, CORRELATION_ID, CLIENT_ID, GROUP_ID).await?;
    assert_eq!(coordinator_res.error_code, KafkaCode::None);
    let coordinator_addr = coordinator_res.coordinator_addr()?;
    let mut coordinator_conn = TcpConnection::connect(vec![coordinator_addr]).await?;

    //
    // Describe the group on its coordinator
    //
    let mut describe_groups_request = protocol::DescribeGroupsRequest::new(CORRELATION_ID, CLIENT_ID);
    describe_groups_request.add(GROUP_ID);
    coordinator_conn.send_request(&describe_groups_request).await?;
    let describe_groups_response = protocol::DescribeGroupsResponse::try_from(
        coordinator_conn.receive_response().await?.freeze(),
    )?;

    assert_eq!(describe_groups_response.header.correlation_id, CORRELATION_ID);
    assert_eq!(describe_groups_response.groups.len(), 1);
    assert_eq!(describe_groups_response.groups[0].error_code, KafkaCode::None);
    assert_eq!(describe_groups_response.groups[0].group_id, GROUP_ID);
    assert!(describe_groups_response.groups[0].members.is_empty());

    Ok(())
}

#[tokio::test]
async fn it_can_describe_unknown_groups() -> Result<(), Box<Error>> {
    let (skip, brokers) = testsupport::get_brokers()?;
    if skip {
        return Ok(());
    }
    let cluster = ClusterBuilder::<TcpConnection>::new(brokers)
        .client_id(CLIENT_ID.to_owned())
        .build()
        .await?;

    let groups = vec![
        GROUP_ID2.to_owned(),
        GROUP_ID.to_owned(),
        GROUP_ID2.to_owned(),
    ];
    let descriptions = cluster
        .describe_consumer_groups(&groups, &CancellationToken::new())
        .await?;

    // groups nobody ever joined are reported as dead with no members
    assert_eq!(descriptions.len(), 2);
    assert_eq!(descriptions[0].group_id, GROUP_ID);
    assert_eq!(descriptions[1].group_id, GROUP_ID2);
    for description in descriptions.iter() {
        assert_eq!(description.state, "Dead");
        assert!(description.members.is_empty());
    }

    Ok(())
}

#[tokio::test]
async fn it_respects_cancellation() -> Result<(), Box<Error>> {
    let (skip, brokers) = testsupport::get_brokers()?;
    if skip {
        return Ok(());
    }
    let cluster = ClusterBuilder::<TcpConnection>::new(brokers).build().await?;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = cluster
        .describe_consumer_groups(&[GROUP_ID.to_owned()], &cancel)
        .await;

    assert_eq!(result, Err(Error::Cancelled));
    Ok(())
}
