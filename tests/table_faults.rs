//! Misbehaving-agent and failure-path tests using the scripted MockSession.

use snmp_tables::error::ErrorStatus;
use snmp_tables::pdu::{Pdu, PduType};
use snmp_tables::session::{MockReply, MockSession, ResponseBuilder};
use snmp_tables::{oid, Error, Oid, TableRequest, TableStatus, Target, Value};

fn target() -> Target {
    Target::new("192.0.2.1:161".parse().unwrap())
}

fn col_a() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 9999, 2, 1, 1)
}

fn col_b() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 9999, 2, 1, 2)
}

/// Exhaustion response for a single-column chunk positioned at `from`.
fn column_rows(column: &Oid, rows: &[(u32, i32)], exhaust: bool) -> Pdu {
    let mut builder = ResponseBuilder::new();
    let mut last = column.clone();
    for &(idx, val) in rows {
        last = column.child(idx);
        builder = builder.vb(last.clone(), Value::Integer(val));
    }
    if exhaust {
        builder = builder.end_of_mib(last);
    }
    builder.build()
}

/// A chunk that completes before an earlier-serial chunk is parked and
/// reconciled in serial order.
#[tokio::test]
async fn out_of_order_chunk_completion_is_parked() {
    let session = MockSession::new();
    // Two single-column chunks per sweep. The first chunk's reply is held
    // back so the second lands first.
    session.push_reply(MockReply::Delayed {
        pdu: column_rows(&col_a(), &[(1, 10), (2, 20)], true),
        polls: 8,
    });
    session.push_response(column_rows(&col_b(), &[(1, 100), (2, 200)], true));

    let result = TableRequest::new(session.clone(), target(), vec![col_a(), col_b()])
        .max_columns_per_chunk(1)
        .pipeline(2)
        .start()
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(result.status, TableStatus::Complete);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.rows[0].values, vec![Some(Value::Integer(10)), Some(Value::Integer(100))]);
    assert_eq!(result.rows[1].values, vec![Some(Value::Integer(20)), Some(Value::Integer(200))]);
    // Both chunks went out before either reply resolved
    assert_eq!(session.requests().len(), 2);
}

/// A timeout fails the retrieval with TimedOut and ends the stream.
#[tokio::test]
async fn timeout_fails_retrieval() {
    let session = MockSession::new();
    session.push_reply(MockReply::Timeout);

    let mut stream = TableRequest::new(session, target(), vec![col_a()])
        .start()
        .unwrap();

    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert!(stream.next().await.is_none());
    assert_eq!(stream.status(), Some(TableStatus::TimedOut));
}

/// Rows released before the failure still come out ahead of the error.
#[tokio::test]
async fn released_rows_precede_error() {
    let session = MockSession::new();
    session.push_response(column_rows(&col_a(), &[(1, 10)], false));
    session.push_reply(MockReply::Timeout);

    let mut stream = TableRequest::new(session, target(), vec![col_a()])
        .start()
        .unwrap();

    let row = stream.next().await.unwrap().unwrap();
    assert_eq!(row.index, oid!(1));
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
    assert!(stream.next().await.is_none());
}

/// An SNMP error status fails the retrieval.
#[tokio::test]
async fn error_status_fails_retrieval() {
    let session = MockSession::new();
    session.push_response(Pdu::error_response(0, ErrorStatus::GenErr, 1));

    let mut stream = TableRequest::new(session, target(), vec![col_a()])
        .start()
        .unwrap();

    let err = stream.next().await.unwrap().unwrap_err();
    match err {
        Error::Snmp { status, .. } => assert_eq!(status, ErrorStatus::GenErr),
        other => panic!("expected Snmp error, got {:?}", other),
    }
    assert_eq!(stream.status(), Some(TableStatus::Failed));
}

/// A Report PDU is fatal.
#[tokio::test]
async fn report_pdu_fails_retrieval() {
    let session = MockSession::new();
    let mut report = ResponseBuilder::new()
        .vb(oid!(1, 3, 6, 1, 6, 3, 15, 1, 1, 1, 0), Value::Counter32(1))
        .build();
    report.pdu_type = PduType::Report;
    session.push_response(report);

    let mut stream = TableRequest::new(session, target(), vec![col_a()])
        .start()
        .unwrap();

    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Report { .. }));
    assert_eq!(stream.status(), Some(TableStatus::Failed));
}

/// An empty response is malformed and fatal.
#[tokio::test]
async fn empty_response_is_malformed() {
    let session = MockSession::new();
    session.push_response(ResponseBuilder::new().build());

    let mut stream = TableRequest::new(session, target(), vec![col_a()])
        .start()
        .unwrap();

    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }));
}

/// At zero tolerance the first regression aborts, and the offending row
/// is still delivered, flagged.
#[tokio::test]
async fn ordering_violation_aborts_and_flags_offender() {
    let session = MockSession::new();
    session.push_response(column_rows(&col_a(), &[(5, 50)], false));
    // Next sweep regresses to row 3
    session.push_response(column_rows(&col_a(), &[(3, 30)], false));

    let mut stream = TableRequest::new(session, target(), vec![col_a()])
        .start()
        .unwrap();

    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.index, oid!(5));
    assert!(!first.order_violation);

    let offender = stream.next().await.unwrap().unwrap();
    assert_eq!(offender.index, oid!(3));
    assert!(offender.order_violation);

    assert!(stream.next().await.is_none());
    assert_eq!(stream.status(), Some(TableStatus::WrongOrder));
    assert_eq!(stream.order_violations(), 1);
}

/// With tolerance, regressions are flagged and the retrieval carries on
/// to exhaustion, finishing WrongOrder.
#[tokio::test]
async fn ordering_violations_tolerated_up_to_budget() {
    let session = MockSession::new();
    session.push_response(column_rows(&col_a(), &[(5, 50)], false));
    // Regression to row 3 followed by forward progress to row 6
    session.push_response(column_rows(&col_a(), &[(3, 30), (6, 60)], false));
    session.push_response(column_rows(&col_a(), &[(7, 70)], true));

    let result = TableRequest::new(session, target(), vec![col_a()])
        .max_order_violations(2)
        .start()
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(result.status, TableStatus::WrongOrder);
    assert_eq!(result.order_violations, 1);

    let indices: Vec<_> = result.rows.iter().map(|r| r.index.clone()).collect();
    assert_eq!(indices, vec![oid!(5), oid!(3), oid!(6), oid!(7)]);
    assert!(result.rows[1].order_violation, "regressed row is flagged");
    assert!(!result.rows[0].order_violation);
}

/// Exceeding the tolerance aborts; the offender is not delivered.
#[tokio::test]
async fn exceeding_tolerance_aborts_without_offender() {
    let session = MockSession::new();
    session.push_response(column_rows(&col_a(), &[(5, 50)], false));
    session.push_response(column_rows(&col_a(), &[(3, 30), (6, 60)], false));
    // Second regression breaks the budget of 1
    session.push_response(column_rows(&col_a(), &[(2, 20)], false));

    let mut stream = TableRequest::new(session, target(), vec![col_a()])
        .max_order_violations(1)
        .start()
        .unwrap();

    let mut indices = Vec::new();
    while let Some(item) = stream.next().await {
        indices.push(item.unwrap().index);
    }
    assert_eq!(stream.status(), Some(TableStatus::WrongOrder));
    assert_eq!(stream.order_violations(), 2);
    assert!(
        !indices.contains(&oid!(2)),
        "offender past the budget is dropped, got {:?}",
        indices
    );
}

/// Replies scripted past the end of the retrieval are never consumed.
#[tokio::test]
async fn extra_replies_left_unconsumed_after_termination() {
    let session = MockSession::new();
    session.push_response(column_rows(&col_a(), &[(1, 10)], true));
    session.push_response(column_rows(&col_a(), &[(2, 20)], true));
    session.push_response(column_rows(&col_a(), &[(3, 30)], true));

    let mut stream = TableRequest::new(session.clone(), target(), vec![col_a()])
        .start()
        .unwrap();

    while let Some(item) = stream.next().await {
        item.unwrap();
    }
    assert_eq!(stream.status(), Some(TableStatus::Complete));
    assert_eq!(session.requests().len(), 1);
    assert_eq!(session.remaining_replies(), 2);

    // Extra polls stay terminal and send nothing
    assert!(stream.next().await.is_none());
    assert_eq!(session.requests().len(), 1);
}

/// Dropping the stream cancels the retrieval; nothing more is sent.
#[tokio::test]
async fn drop_cancels_retrieval() {
    let session = MockSession::new();
    session.push_response(column_rows(&col_a(), &[(1, 10)], false));
    session.push_response(column_rows(&col_a(), &[(2, 20)], false));

    let mut stream = TableRequest::new(session.clone(), target(), vec![col_a()])
        .start()
        .unwrap();

    let row = stream.next().await.unwrap().unwrap();
    assert_eq!(row.index, oid!(1));
    drop(stream);

    // Only the request issued before the drop exists
    assert_eq!(session.requests().len(), 1);
    assert_eq!(session.remaining_replies(), 1);
}

/// A duplicated instance in one response counts as a violation but the
/// duplicate value does not overwrite the original.
#[tokio::test]
async fn duplicate_instance_does_not_overwrite() {
    let session = MockSession::new();
    let pdu = ResponseBuilder::new()
        .vb(col_a().child(1), Value::Integer(10))
        .vb(col_a().child(1), Value::Integer(999))
        .vb(col_a().child(2), Value::Integer(20))
        .end_of_mib(col_a().child(2))
        .build();
    session.push_response(pdu);

    let result = TableRequest::new(session, target(), vec![col_a()])
        .max_order_violations(5)
        .start()
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(result.status, TableStatus::WrongOrder);
    assert_eq!(result.rows[0].values[0], Some(Value::Integer(10)));
    assert!(result.rows[0].order_violation);
}

/// Dense-verify fills a cell the walk missed, releasing the row complete.
#[tokio::test]
async fn dense_verify_fills_missed_cell() {
    use snmp_tables::TableMode;

    let session = MockSession::new();
    // Walk: column a has rows 1-2, column b only row 2
    let walk = ResponseBuilder::new()
        .vb(col_a().child(1), Value::Integer(10))
        .vb(col_b().child(2), Value::Integer(200))
        .vb(col_a().child(2), Value::Integer(20))
        .end_of_mib(col_b().child(2))
        .build();
    session.push_response(walk);
    // Double-check GET: the cell exists after all
    session.push_response(
        ResponseBuilder::new()
            .vb(col_b().child(1), Value::Integer(100))
            .build(),
    );
    // Final sweep exhausts column a
    session.push_response(
        ResponseBuilder::new().end_of_mib(col_a().child(2)).build(),
    );

    let result = TableRequest::new(session.clone(), target(), vec![col_a(), col_b()])
        .mode(TableMode::DenseVerify)
        .start()
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(result.status, TableStatus::Complete);
    assert_eq!(result.rows_dropped, 0);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(
        result.rows[0].values,
        vec![Some(Value::Integer(10)), Some(Value::Integer(100))]
    );

    let request_types: Vec<_> = session.requests().iter().map(|p| p.pdu_type).collect();
    assert!(request_types.contains(&PduType::GetRequest));
}

/// Varbinds carrying exception values exhaust their column mid-response.
#[tokio::test]
async fn trailing_end_of_mib_view_after_data() {
    let session = MockSession::new();
    let pdu = ResponseBuilder::new()
        .vb(col_a().child(1), Value::Integer(10))
        .vb(col_b().child(1), Value::Integer(100))
        .vb(col_a().child(2), Value::Integer(20))
        .end_of_mib(col_b().child(1))
        .vb(col_a().child(3), Value::Integer(30))
        .end_of_mib(col_b().child(1))
        .build();
    session.push_response(pdu);
    session.push_response(
        ResponseBuilder::new().end_of_mib(col_a().child(3)).build(),
    );

    let result = TableRequest::new(session, target(), vec![col_a(), col_b()])
        .start()
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(result.status, TableStatus::Complete);
    assert_eq!(result.rows.len(), 3);
    assert_eq!(result.rows[0].values[1], Some(Value::Integer(100)));
    assert_eq!(result.rows[1].values[1], None);
    assert_eq!(result.rows[2].values[1], None);
}
