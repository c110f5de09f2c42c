use crate::streaming::backoff::backoff_delay;
use crate::streaming::machine::state::MachineState;
use crate::streaming::machine::types::{ConnectionState, StreamCommand};

pub fn on_start(m: &mut MachineState) -> Vec<StreamCommand> {
    match m.state {
        ConnectionState::Disconnected | ConnectionState::Error => {
            log::debug!("[STREAM] {} -> connecting", m.state);
            m.state = ConnectionState::Connecting;
            vec![StreamCommand::OpenChannel]
        }
        other => {
            log::trace!("[STREAM] start ignored while {}", other);
            vec![]
        }
    }
}

pub fn on_opened(m: &mut MachineState) -> Vec<StreamCommand> {
    if m.state != ConnectionState::Connecting {
        log::trace!("[STREAM] stale open signal while {}", m.state);
        return vec![];
    }

    log::info!("[STREAM] connected (after {} retries)", m.retry_count);
    m.state = ConnectionState::Connected;
    m.retry_count = 0;
    m.last_error = None;
    vec![]
}

pub fn on_failed(m: &mut MachineState, reason: String) -> Vec<StreamCommand> {
    if !matches!(m.state, ConnectionState::Connecting | ConnectionState::Connected) {
        log::trace!("[STREAM] stale failure while {}: {}", m.state, reason);
        return vec![];
    }

    let mut cmds = vec![StreamCommand::CloseChannel];

    if m.retry_count < m.max_retries {
        m.retry_count += 1;
        let delay = backoff_delay(m.retry_count);
        log::warn!(
            "[STREAM] channel failed ({}); retry {}/{} in {:?}",
            reason,
            m.retry_count,
            m.max_retries,
            delay
        );
        m.state = ConnectionState::Retrying;
        m.last_error = Some(reason);
        cmds.push(StreamCommand::ScheduleRetry {
            attempt: m.retry_count,
            delay,
        });
    } else {
        log::warn!(
            "[STREAM] giving up after {} retries ({}); polling only",
            m.retry_count,
            reason
        );
        m.state = ConnectionState::Error;
        m.last_error = Some(format!(
            "Live updates unavailable after {} retries ({}); falling back to polling",
            m.retry_count, reason
        ));
        cmds.push(StreamCommand::FallBackToPolling);
    }

    cmds
}

pub fn on_retry_due(m: &mut MachineState) -> Vec<StreamCommand> {
    if m.state != ConnectionState::Retrying {
        log::trace!("[STREAM] stale retry timer while {}", m.state);
        return vec![];
    }

    log::debug!("[STREAM] retry {} -> connecting", m.retry_count);
    m.state = ConnectionState::Connecting;
    vec![StreamCommand::OpenChannel]
}

pub fn on_stop(m: &mut MachineState) -> Vec<StreamCommand> {
    log::debug!("[STREAM] {} -> disconnected", m.state);
    m.state = ConnectionState::Disconnected;
    m.retry_count = 0;
    m.last_error = None;
    vec![StreamCommand::CancelRetry, StreamCommand::CloseChannel]
}
