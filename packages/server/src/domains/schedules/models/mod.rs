pub mod schedule;

pub use schedule::{
    CreateOneOffSchedule, CreateOperatingHoursSchedule, CreateRecurringSchedule, Schedule,
    UpdateScheduleParams,
};
