//! # Session Operations
//!
//! Typed operations over one `WorkerSession`. Each builds its request,
//! executes it, and accepts only the response kind that answers it; an
//! engine `error` becomes `QueryError::Protocol`, anything else is
//! `UnexpectedResponse`.
//!
//! Composite operations (`smc.load` then `smc.runGetMethod`,
//! `raw.createQuery` then `query.send`) run here as one call, so they are
//! always submitted to the pool as one job and never split across
//! sessions: contract and query ids are local to the session that issued
//! them.

use crate::adapters::WorkerSession;
use crate::algorithms::TransactionPaginator;
use crate::domain::{
    AccountState, Address, ExtendedAccountState, MethodRef, QueryError, QueryFees, QueryInfo,
    RawTransaction, RawTransactions, RunResult, StackEntry, TransactionId,
};
use crate::protocol::{QueryBuilder, Request, Response};

/// `raw.getAccountState`
pub fn account_state(session: &mut WorkerSession, address: &Address) -> Result<AccountState, QueryError> {
    let request = QueryBuilder::get_account_state(address);
    match session.exec(&request)? {
        Response::AccountState(state) => Ok(state),
        other => Err(other.mismatch(request.tag())),
    }
}

/// `generic.getAccountState`
pub fn extended_account_state(
    session: &mut WorkerSession,
    address: &Address,
) -> Result<ExtendedAccountState, QueryError> {
    let request = QueryBuilder::get_extended_account_state(address);
    match session.exec(&request)? {
        Response::ExtendedAccountState(state) => Ok(state),
        other => Err(other.mismatch(request.tag())),
    }
}

/// One `raw.getTransactions` batch.
pub fn raw_transactions(
    session: &mut WorkerSession,
    address: &Address,
    from: TransactionId,
) -> Result<RawTransactions, QueryError> {
    let request = QueryBuilder::get_transactions(address, from);
    match session.exec(&request)? {
        Response::Transactions(batch) => Ok(batch),
        other => Err(other.mismatch(request.tag())),
    }
}

/// History walk from `from`, or from the account's last transaction when
/// `from` is `None`.
pub fn transactions(
    session: &mut WorkerSession,
    address: &Address,
    from: Option<TransactionId>,
    paginator: TransactionPaginator,
) -> Result<Vec<RawTransaction>, QueryError> {
    let start = match from {
        Some(id) => id,
        None => match account_state(session, address)?.history_head() {
            Some(id) => id,
            None => return Ok(Vec::new()),
        },
    };

    let mut source = |cursor: TransactionId| raw_transactions(session, address, cursor);
    paginator.walk(&mut source, start)
}

/// `smc.load`, returning the session-local contract id.
pub fn load_contract(session: &mut WorkerSession, address: &Address) -> Result<i64, QueryError> {
    let request = QueryBuilder::load_contract(address);
    match session.exec(&request)? {
        Response::SmcInfo { id } => Ok(id),
        other => Err(other.mismatch(request.tag())),
    }
}

/// `smc.load` followed by `smc.runGetMethod` on the same session.
pub fn run_get_method(
    session: &mut WorkerSession,
    address: &Address,
    method: &MethodRef,
    stack: &[StackEntry],
) -> Result<RunResult, QueryError> {
    let contract = load_contract(session, address)?;
    let request = QueryBuilder::run_get_method(contract, method, stack);
    match session.exec(&request)? {
        Response::RunResult(result) => Ok(result),
        other => Err(other.mismatch(request.tag())),
    }
}

/// `raw.sendMessage`
pub fn send_message(session: &mut WorkerSession, boc: &[u8]) -> Result<(), QueryError> {
    let request = QueryBuilder::send_message(boc);
    expect_ok(session, &request)
}

/// `raw.createQuery`, returning the prepared query.
pub fn create_query(
    session: &mut WorkerSession,
    destination: &Address,
    body: &[u8],
    init_code: &[u8],
    init_data: &[u8],
) -> Result<QueryInfo, QueryError> {
    let request = QueryBuilder::create_query(destination, body, init_code, init_data);
    match session.exec(&request)? {
        Response::QueryInfo(info) => Ok(info),
        other => Err(other.mismatch(request.tag())),
    }
}

/// `query.send`
pub fn send_query(session: &mut WorkerSession, query_id: i64) -> Result<(), QueryError> {
    let request = QueryBuilder::send_query(query_id);
    expect_ok(session, &request)
}

/// `query.estimateFees`
pub fn estimate_fees(
    session: &mut WorkerSession,
    query_id: i64,
    ignore_chksig: bool,
) -> Result<QueryFees, QueryError> {
    let request = QueryBuilder::estimate_fees(query_id, ignore_chksig);
    match session.exec(&request)? {
        Response::QueryFees(fees) => Ok(fees),
        other => Err(other.mismatch(request.tag())),
    }
}

/// `raw.createQuery` then `query.send`.
pub fn create_and_send_query(
    session: &mut WorkerSession,
    destination: &Address,
    body: &[u8],
    init_code: &[u8],
    init_data: &[u8],
) -> Result<(), QueryError> {
    let query = create_query(session, destination, body, init_code, init_data)?;
    send_query(session, query.id)
}

/// `raw.createQuery` then `query.estimateFees`.
pub fn estimate_query_fees(
    session: &mut WorkerSession,
    destination: &Address,
    body: &[u8],
    init_code: &[u8],
    init_data: &[u8],
    ignore_chksig: bool,
) -> Result<QueryFees, QueryError> {
    let query = create_query(session, destination, body, init_code, init_data)?;
    estimate_fees(session, query.id, ignore_chksig)
}

/// `raw.createAndSendMessage`
pub fn create_and_send_message(
    session: &mut WorkerSession,
    destination: &Address,
    body: &[u8],
    initial_account_state: &[u8],
) -> Result<(), QueryError> {
    let request = QueryBuilder::create_and_send_message(destination, body, initial_account_state);
    expect_ok(session, &request)
}

fn expect_ok(session: &mut WorkerSession, request: &Request) -> Result<(), QueryError> {
    match session.exec(request)? {
        Response::Ok => Ok(()),
        other => Err(other.mismatch(request.tag())),
    }
}
