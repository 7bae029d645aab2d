use serde_json::json;
use std::{collections::HashMap, fs::File, io::BufWriter};

pub fn create_replay_logger(
    filename: Option<String>,
    num_tunnels: usize,
    tunnel_length: usize,
) -> Box<dyn ReplayLogger> {
    match filename {
        None => Box::new(NoOpReplayLogger {}),
        Some(filename) => Box::new(JsonReplayLogger::new(filename, num_tunnels, tunnel_length)),
    }
}

pub trait ReplayLogger: Send + Sync {
    #[allow(unused_variables)]
    fn log_turn(&mut self, turn: usize, ants: usize, bees: usize, food: usize) {}

    #[allow(unused_variables)]
    fn log_end_game(&mut self, reason: String) {}

    #[allow(unused_variables)]
    fn log_event(&mut self, turn: usize, event: Event) {}

    fn clear(&mut self) {}

    fn save(&self) {}

    fn log_deploy_ant(&mut self, turn: usize, id: String, name: String, location: String) {
        self.log_event(
            turn,
            Event {
                event_type: EventType::Deploy,
                entity: name,
                entity_id: Some(id),
                location: Some(location),
                destination: None,
            },
        );
    }

    fn log_remove_ant(&mut self, turn: usize, id: String, name: String, location: Option<String>) {
        self.log_remove(turn, name, Some(id), location);
    }

    fn log_remove_bee(&mut self, turn: usize, id: String, location: Option<String>) {
        self.log_remove(turn, "Bee".to_string(), Some(id), location);
    }

    fn log_move_bee(&mut self, turn: usize, id: String, location: String, destination: String) {
        self.log_event(
            turn,
            Event {
                event_type: EventType::Move,
                entity: "Bee".to_string(),
                entity_id: Some(id),
                location: Some(location),
                destination: Some(destination),
            },
        );
    }

    fn log_attack(
        &mut self,
        turn: usize,
        entity: String,
        id: String,
        location: String,
        destination: String,
    ) {
        self.log_event(
            turn,
            Event {
                event_type: EventType::Attack,
                entity,
                entity_id: Some(id),
                location: Some(location),
                destination: Some(destination),
            },
        );
    }

    fn log_boost_found(&mut self, turn: usize, boost: String) {
        self.log_event(
            turn,
            Event {
                event_type: EventType::Boost,
                entity: boost,
                entity_id: None,
                location: None,
                destination: None,
            },
        );
    }

    fn log_boost_given(&mut self, turn: usize, boost: String, location: String) {
        self.log_event(
            turn,
            Event {
                event_type: EventType::Boost,
                entity: boost,
                entity_id: None,
                location: Some(location),
                destination: None,
            },
        );
    }

    fn log_swallow_bee(&mut self, turn: usize, id: String, location: String) {
        self.log_event(
            turn,
            Event {
                event_type: EventType::Swallow,
                entity: "Bee".to_string(),
                entity_id: Some(id),
                location: Some(location),
                destination: None,
            },
        );
    }

    fn log_regurgitate_bee(&mut self, turn: usize, id: String, location: String) {
        self.log_event(
            turn,
            Event {
                event_type: EventType::Regurgitate,
                entity: "Bee".to_string(),
                entity_id: Some(id),
                location: None,
                destination: Some(location),
            },
        );
    }

    fn log_release_bee(&mut self, turn: usize, id: String, destination: String) {
        self.log_event(
            turn,
            Event {
                event_type: EventType::Release,
                entity: "Bee".to_string(),
                entity_id: Some(id),
                location: Some("Hive".to_string()),
                destination: Some(destination),
            },
        );
    }

    fn log_remove(
        &mut self,
        turn: usize,
        entity: String,
        id: Option<String>,
        location: Option<String>,
    ) {
        self.log_event(
            turn,
            Event {
                event_type: EventType::Remove,
                entity,
                entity_id: id,
                location,
                destination: None,
            },
        );
    }
}

#[derive(serde::Serialize)]
enum EventType {
    Deploy,
    Remove,
    Move,
    Attack,
    Boost,
    Swallow,
    Regurgitate,
    Release,
}

#[derive(serde::Serialize)]
pub struct Event {
    event_type: EventType,
    entity: String,
    entity_id: Option<String>,
    location: Option<String>,
    destination: Option<String>,
}

struct Turn {
    turn: usize,
    ants: usize,
    bees: usize,
    food: usize,
}

pub(crate) struct NoOpReplayLogger;
impl ReplayLogger for NoOpReplayLogger {}

struct JsonReplayLogger {
    filename: String,
    num_tunnels: usize,
    tunnel_length: usize,
    turns: Vec<Turn>,
    events: HashMap<usize, Vec<Event>>,
    finished_reason: Option<String>,
}

impl JsonReplayLogger {
    pub fn new(filename: String, num_tunnels: usize, tunnel_length: usize) -> JsonReplayLogger {
        JsonReplayLogger {
            filename,
            num_tunnels,
            tunnel_length,
            turns: Vec::new(),
            events: HashMap::new(),
            finished_reason: None,
        }
    }
}

impl ReplayLogger for JsonReplayLogger {
    fn log_turn(&mut self, turn: usize, ants: usize, bees: usize, food: usize) {
        self.turns.push(Turn {
            turn,
            ants,
            bees,
            food,
        });
    }

    fn log_end_game(&mut self, reason: String) {
        self.finished_reason = Some(reason);
    }

    fn log_event(&mut self, turn: usize, event: Event) {
        self.events.entry(turn).or_default().push(event);
    }

    fn clear(&mut self) {
        self.turns.clear();
        self.events.clear();
    }

    fn save(&self) {
        let file = File::create(&self.filename).unwrap();
        let turns: Vec<_> = self
            .turns
            .iter()
            .map(|turn| {
                json!({
                    "turn": turn.turn,
                    "ants": turn.ants,
                    "bees": turn.bees,
                    "food": turn.food,
                    "events": self.events.get(&turn.turn).unwrap_or(&Vec::new()),
                })
            })
            .collect();

        let data = json!({
            "colony": {
                "tunnels": self.num_tunnels,
                "tunnel_length": self.tunnel_length,
            },
            "turns": turns,
            "finished_reason": self.finished_reason,
        });

        let mut writer = BufWriter::new(&file);
        serde_json::to_writer_pretty(&mut writer, &data).unwrap();
    }
}
