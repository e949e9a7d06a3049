use chrono::{NaiveDate, NaiveTime};
use mockall::mock;
use uuid::Uuid;

use crate::models::{DbDuty, DbDutyChart, DbDutyDetail, DbOffice, DbSchedule, DbUser};
use rosterd_core::errors::RosterResult;
use rosterd_core::models::duty::{
    BulkUpsertItem, BulkUpsertResponse, GenerateRotationRequest, RotationResponse,
};

// Mock repositories for testing
mock! {
    pub ScheduleRepo {
        pub async fn create_schedule(
            &self,
            name: &'static str,
            start_time: NaiveTime,
            end_time: NaiveTime,
            office_id: Option<Uuid>,
        ) -> RosterResult<DbSchedule>;

        pub async fn get_schedule_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbSchedule>>;

        pub async fn list_schedules_for_office(
            &self,
            office_id: Uuid,
        ) -> eyre::Result<Vec<DbSchedule>>;

        pub async fn delete_schedule(
            &self,
            id: Uuid,
        ) -> RosterResult<()>;
    }
}

mock! {
    pub DutyChartRepo {
        pub async fn create_duty_chart(
            &self,
            office_id: Uuid,
            effective_date: NaiveDate,
            end_date: Option<NaiveDate>,
        ) -> RosterResult<DbDutyChart>;

        pub async fn get_duty_chart_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbDutyChart>>;

        pub async fn list_duty_charts(
            &self,
            office_id: Option<Uuid>,
        ) -> eyre::Result<Vec<DbDutyChart>>;

        pub async fn find_chart_containing(
            &self,
            office_id: Uuid,
            date: NaiveDate,
        ) -> eyre::Result<Option<DbDutyChart>>;
    }
}

mock! {
    pub DutyRepo {
        pub async fn list_duties(
            &self,
            office_id: Option<Uuid>,
            user_id: Option<Uuid>,
            schedule_id: Option<Uuid>,
            duty_chart_id: Option<Uuid>,
            date_from: Option<NaiveDate>,
            date_to: Option<NaiveDate>,
        ) -> eyre::Result<Vec<DbDutyDetail>>;

        pub async fn get_duty_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbDuty>>;

        pub async fn bulk_upsert(
            &self,
            items: Vec<BulkUpsertItem>,
            assign_any_office: bool,
        ) -> RosterResult<BulkUpsertResponse>;

        pub async fn generate_rotation(
            &self,
            req: GenerateRotationRequest,
        ) -> RosterResult<RotationResponse>;

        pub async fn delete_duty(
            &self,
            id: Uuid,
        ) -> RosterResult<()>;
    }
}

mock! {
    pub DirectoryRepo {
        pub async fn get_user_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbUser>>;

        pub async fn get_office_by_id(
            &self,
            id: Uuid,
        ) -> eyre::Result<Option<DbOffice>>;

        pub async fn list_users(
            &self,
        ) -> eyre::Result<Vec<DbUser>>;
    }
}

mock! {
    pub AuthzRepo {
        pub async fn has_permission(
            &self,
            user_id: Uuid,
            slug: &'static str,
        ) -> eyre::Result<bool>;

        pub async fn allowed_office_ids(
            &self,
            user_id: Uuid,
        ) -> eyre::Result<Vec<Uuid>>;
    }
}
