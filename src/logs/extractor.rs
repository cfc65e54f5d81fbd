//! Log Event Extractor
//!
//! Pure function from one agent's log text to its event sequence. Each
//! logical entry is run through every rule family independently, so one
//! entry may yield several events. A rule whose keyword matches but whose
//! numeric capture does not simply yields nothing.

use once_cell::sync::Lazy;
use regex::Regex;

use super::entry::{parse_entries, LogEntry};
use super::events::{
    CommunicationEvent, CommunicationKind, Direction, LogEvent, MovementEvent, MovementKind,
    ProgressEvent, ProgressMarker, QueueEvent, QueueTrigger, RouteLifecycleEvent, RoutePhase,
};

const POSITION_KEYWORDS: &[&str] = &[
    "ARRIVED at customer",
    "RETURNED to depot",
    "Moving to",
    "Starting route",
    "at (",
    "Position",
];

static COORDINATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((-?\d+(?:\.\d+)?),\s*(-?\d+(?:\.\d+)?)\)").expect("valid coordinate regex")
});
static CUSTOMER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)customer\s+([^\s(]+)").expect("valid customer regex"));
static QUEUE_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Queue size:\s*(\d+)").expect("valid queue size regex"));
static ENQUEUED_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)route\s+(\S+)\s+added to queue").expect("valid enqueued route regex")
});
static CLAIMED_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Processing route (?:from queue:\s*(\S+)|(\S+) from queue)")
        .expect("valid claimed route regex")
});
static REMAINING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Remaining(?: routes in queue)?:\s*(\d+)").expect("valid remaining regex")
});
static COMPLETED_ROUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"RETURNED to depot\.?\s*Route\s+(\S+)\s+completed")
        .expect("valid completed route regex")
});
static QUERYING_DA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Querying DA:\s*(\S+)").expect("valid query regex"));
static ASSIGNING_ROUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Assigning route\b").expect("valid assignment regex"));
static UNSERVED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Unserved customers:\s*(\d+)").expect("valid unserved regex"));
static SOLUTION_FOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:VRP s|S)olution found").expect("valid solution regex"));
static NO_SOLUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bno solution found").expect("valid no-solution regex"));

/// Parse raw log text into events
pub fn extract_events(text: &str) -> Vec<LogEvent> {
    events_from_entries(&parse_entries(text))
}

/// Classify already reconstructed entries
pub fn events_from_entries(entries: &[LogEntry]) -> Vec<LogEvent> {
    let mut events = Vec::new();
    for entry in entries {
        classify(entry, &mut events);
    }
    events
}

fn classify(entry: &LogEntry, out: &mut Vec<LogEvent>) {
    let text = entry.message.as_str();

    if let Some(event) = movement(entry) {
        out.push(LogEvent::Movement(event));
    }
    queue(entry, out);
    if let Some(event) = communication(entry) {
        out.push(LogEvent::Communication(event));
    }
    progress(entry, text, out);
}

fn route_id(raw: &str) -> String {
    raw.trim_end_matches(['.', ',', ';', ':']).to_string()
}

fn movement(entry: &LogEntry) -> Option<MovementEvent> {
    let text = entry.message.as_str();
    if !POSITION_KEYWORDS.iter().any(|k| text.contains(k)) {
        return None;
    }

    let caps = COORDINATES.captures(text)?;
    let x = caps[1].parse::<f64>().ok()?;
    let y = caps[2].parse::<f64>().ok()?;

    let (kind, customer) = if text.contains("ARRIVED at customer") {
        let customer = CUSTOMER.captures(text).map(|c| c[1].to_string());
        (MovementKind::ArrivalAtCustomer, customer)
    } else if text.contains("RETURNED to depot") {
        (MovementKind::ReturnToDepot, None)
    } else if text.contains("Starting route") {
        (MovementKind::RouteStart, None)
    } else {
        (MovementKind::Moving, None)
    };

    Some(MovementEvent {
        timestamp: entry.timestamp.clone(),
        x,
        y,
        kind,
        customer,
    })
}

fn queue(entry: &LogEntry, out: &mut Vec<LogEvent>) {
    let text = entry.message.as_str();
    let timestamp = || entry.timestamp.clone();

    if text.to_lowercase().contains("added to queue") {
        if let Some(caps) = ENQUEUED_ROUTE.captures(text) {
            out.push(LogEvent::RouteLifecycle(RouteLifecycleEvent {
                timestamp: timestamp(),
                route_id: route_id(&caps[1]),
                phase: RoutePhase::Queued,
            }));
        }
        if let Some(size) = QUEUE_SIZE
            .captures(text)
            .and_then(|c| c[1].parse::<u32>().ok())
        {
            out.push(LogEvent::Queue(QueueEvent {
                timestamp: timestamp(),
                queue_size: Some(size),
                current_route_id: None,
                trigger: QueueTrigger::Enqueued,
            }));
        }
    }

    if let Some(caps) = CLAIMED_ROUTE.captures(text) {
        let claimed = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| route_id(m.as_str()));
        // A claim is a queue marker even when the agent logs no remaining count
        out.push(LogEvent::Queue(QueueEvent {
            timestamp: timestamp(),
            queue_size: REMAINING
                .captures(text)
                .and_then(|c| c[1].parse::<u32>().ok()),
            current_route_id: claimed.clone(),
            trigger: QueueTrigger::Claimed,
        }));
        if let Some(route) = claimed {
            out.push(LogEvent::RouteLifecycle(RouteLifecycleEvent {
                timestamp: timestamp(),
                route_id: route,
                phase: RoutePhase::Executing,
            }));
        }
    }

    if text.contains("Route queue is empty") {
        out.push(LogEvent::Queue(QueueEvent {
            timestamp: timestamp(),
            queue_size: Some(0),
            current_route_id: None,
            trigger: QueueTrigger::Drained,
        }));
    }

    if let Some(caps) = COMPLETED_ROUTE.captures(text) {
        out.push(LogEvent::RouteLifecycle(RouteLifecycleEvent {
            timestamp: timestamp(),
            route_id: route_id(&caps[1]),
            phase: RoutePhase::Completed,
        }));
    }
}

/// At most one communication per logical entry. When a continuation line
/// names a second message kind only the first matching kind is reported.
fn communication(entry: &LogEntry) -> Option<CommunicationEvent> {
    let text = entry.message.as_str();

    // Responses first: "Route assignment response" would otherwise read as an assignment
    let kind = if text.contains("QUERY_VEHICLE_INFO") || text.contains("Vehicle info query") {
        CommunicationKind::Query
    } else if text.contains("ROUTE_ACCEPTED")
        || text.contains("ROUTE_REJECTED")
        || text.contains("ACCEPTED by vehicle")
        || text.contains("REJECTED by vehicle")
        || text.contains("Route assignment response")
    {
        CommunicationKind::RouteResponse
    } else if text.contains("ROUTE_ASSIGNMENT")
        || text.contains("Route assignment")
        || text.contains("route assignment message")
    {
        CommunicationKind::RouteAssignment
    } else {
        return None;
    };

    let direction = if text.contains(">>> SENT") {
        Direction::Sent
    } else if text.contains("<<< RECEIVED") {
        Direction::Received
    } else if kind == CommunicationKind::RouteResponse {
        Direction::Received
    } else {
        Direction::Sent
    };

    Some(CommunicationEvent {
        timestamp: entry.timestamp.clone(),
        direction,
        kind,
        raw: entry.first_line().to_string(),
    })
}

fn progress(entry: &LogEntry, text: &str, out: &mut Vec<LogEvent>) {
    let mut push = |marker| {
        out.push(LogEvent::Progress(ProgressEvent {
            timestamp: entry.timestamp.clone(),
            marker,
        }))
    };

    if let Some(caps) = QUERYING_DA.captures(text) {
        push(ProgressMarker::VehicleQueried {
            agent: route_id(&caps[1]),
        });
    }
    if ASSIGNING_ROUTE.is_match(text) {
        push(ProgressMarker::RouteAssigning);
    }
    if let Some(count) = UNSERVED
        .captures(text)
        .and_then(|c| c[1].parse::<u32>().ok())
    {
        push(ProgressMarker::UnservedCustomers { count });
    }
    if text.contains("Solving") {
        push(ProgressMarker::Solving);
    }
    if SOLUTION_FOUND.is_match(text) && !NO_SOLUTION.is_match(text) {
        push(ProgressMarker::SolutionFound);
    }
}
