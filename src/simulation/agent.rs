//! Agents and their daily schedule
//!
//! Every agent cycles home -> work -> home once per simulated day. The
//! state machine here only decides what to do; [`CityState`] carries the
//! decision out against structures and the navigator.
//!
//! [`CityState`]: super::world::CityState

use super::types::{AgentId, Position, StructureId};

/// Which way a trip goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trip {
    ToWork,
    ToHome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    /// At home, hidden
    #[default]
    Chilling,
    /// At the workplace, hidden
    Working,
    Moving(Trip),
}

/// What the owner of an agent should do this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    None,
    GoToWork,
    GoHome,
    Arrive,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub id: AgentId,
    pub home: Option<StructureId>,
    pub workplace: Option<StructureId>,
    /// Fraction of the day when work starts
    pub start_time: f32,
    /// Fraction of the day when work ends
    pub end_time: f32,
    pub activity: Activity,
    pub destination: Option<StructureId>,
    pub position: Position,
    pub visible: bool,
}

impl Agent {
    pub fn new(id: AgentId, start_time: f32, end_time: f32) -> Self {
        Self {
            id,
            home: None,
            workplace: None,
            start_time,
            end_time,
            activity: Activity::Chilling,
            destination: None,
            position: Position::default(),
            visible: false,
        }
    }

    pub fn is_work_hours(&self, time_of_day: f32) -> bool {
        self.start_time <= time_of_day && time_of_day < self.end_time
    }

    /// Structure the current trip is heading to
    pub fn trip_target(&self) -> Option<StructureId> {
        match self.activity {
            Activity::Moving(Trip::ToWork) => self.workplace,
            Activity::Moving(Trip::ToHome) => self.home,
            _ => None,
        }
    }

    /// Decides the next transition.
    ///
    /// `arrived` is the navigator's verdict for the current destination and
    /// is only consulted while moving.
    pub fn next_action(&self, time_of_day: f32, arrived: bool) -> ScheduleAction {
        match self.activity {
            Activity::Chilling => {
                if self.is_work_hours(time_of_day) && self.workplace.is_some() {
                    ScheduleAction::GoToWork
                } else {
                    ScheduleAction::None
                }
            }
            Activity::Working => {
                if time_of_day >= self.end_time {
                    ScheduleAction::GoHome
                } else {
                    ScheduleAction::None
                }
            }
            Activity::Moving(_) => {
                if self.destination.is_some() && arrived {
                    ScheduleAction::Arrive
                } else {
                    ScheduleAction::None
                }
            }
        }
    }

    pub fn is_moving(&self) -> bool {
        matches!(self.activity, Activity::Moving(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::types::SimId;

    fn commuter() -> Agent {
        let mut agent = Agent::new(AgentId(SimId(1)), 0.2, 0.7);
        agent.home = Some(StructureId(SimId(10)));
        agent.workplace = Some(StructureId(SimId(20)));
        agent
    }

    #[test]
    fn work_hours_are_half_open() {
        let agent = commuter();
        assert!(!agent.is_work_hours(0.19));
        assert!(agent.is_work_hours(0.2));
        assert!(agent.is_work_hours(0.69));
        assert!(!agent.is_work_hours(0.7));
    }

    #[test]
    fn chilling_agents_leave_during_work_hours() {
        let agent = commuter();
        assert_eq!(agent.next_action(0.1, false), ScheduleAction::None);
        assert_eq!(agent.next_action(0.25, false), ScheduleAction::GoToWork);
        assert_eq!(agent.next_action(0.75, false), ScheduleAction::None);
    }

    #[test]
    fn jobless_agents_stay_home() {
        let mut agent = commuter();
        agent.workplace = None;
        assert_eq!(agent.next_action(0.5, false), ScheduleAction::None);
    }

    #[test]
    fn workers_go_home_at_end_time() {
        let mut agent = commuter();
        agent.activity = Activity::Working;
        assert_eq!(agent.next_action(0.5, false), ScheduleAction::None);
        assert_eq!(agent.next_action(0.7, false), ScheduleAction::GoHome);
    }

    #[test]
    fn moving_agents_arrive_only_when_navigator_agrees() {
        let mut agent = commuter();
        agent.activity = Activity::Moving(Trip::ToWork);
        agent.destination = agent.workplace;
        assert_eq!(agent.next_action(0.3, false), ScheduleAction::None);
        assert_eq!(agent.next_action(0.3, true), ScheduleAction::Arrive);
        assert_eq!(agent.trip_target(), Some(StructureId(SimId(20))));
    }
}
