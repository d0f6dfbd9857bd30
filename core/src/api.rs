//! Every Campbell Cloud operation the client exposes.
//!
//! Most operations are rows in the `endpoints!` table below. The few whose
//! body is derived rather than forwarded (validated software updates,
//! stamped alert configurations, and the like) are written out by hand
//! further down, but still go through a descriptor and `CampbellCloud::request`.
//!
//! Doc comments record service behavior observed in practice: fields the
//! service requires without documenting them, routes that answer "no Route
//! matched", and statuses that differ from the documentation. Those
//! responses are returned as they are.

use serde_json::{json, Map, Value};

use crate::client::CampbellCloud;
use crate::endpoint::{descriptor, endpoints, EndpointDescriptor, RequestArgs};
use crate::error::ApiError;
use crate::normalize::NormalizedResult;
use crate::session::{Credentials, TOKEN_EXCHANGE};
use crate::types::{alert_configuration_stamp, merge_object, SoftwareUpdate};

endpoints! {
    // Assets

    fn list_assets() => Get Organization "assets";

    /// The service also requires `model`, `name`, `manufacturer`, `status`,
    /// `configuration` and `uid`; `serial` is optional.
    fn create_asset() => Post Organization "assets" json metadata;

    fn get_asset(asset_id) => Get Organization "assets/{asset_id}";

    /// `name`, `model`, `manufacturer`, `status` and `configuration`
    /// (`timezone`, `communication_threshold`) are required. Omitting
    /// `serial` and `uid` drops them from the asset.
    fn update_asset(asset_id) => Put Organization "assets/{asset_id}" json metadata;

    fn delete_asset(asset_id) => Delete Organization "assets/{asset_id}";

    fn get_asset_state(asset_id) => Get Organization "assets/{asset_id}/state";

    fn update_asset_state(asset_id) => Put Organization "assets/{asset_id}/status"
        body { status: &str => "status" };

    fn update_asset_metadata(asset_id) => Put Organization "assets/{asset_id}/metadata" json metadata;

    fn list_asset_historical(asset_id) => Get Organization "assets/{asset_id}/historical"
        query { start_epoch: i64 => "startEpoch", end_epoch: i64 => "endEpoch" };

    fn get_asset_historical_by_id(asset_id, asset_historical_id) =>
        Get Organization "assets/{asset_id}/historical/{asset_historical_id}";

    /// Deprecated by the service.
    fn get_asset_subscription(asset_id) => Get Organization "assets/{asset_id}/subscription";

    // Datapoints and datastreams

    /// The service currently answers "no Route matched with those values".
    fn get_datapoints() => Get Organization "datapoints"
        query {
            aliases: &[String] => "aliases",
            start_epoch: i64 => "startEpoch",
            end_epoch: i64 => "endEpoch",
            brief: bool => "brief",
        };

    /// Filters travel in a JSON body on a GET; unset ids are sent as null.
    fn list_datastreams() => Get Organization "datastreams"
        body {
            limit: u32 => "limit",
            offset: u32 => "offset",
            asset_id: Option<&str> => "assetId",
            station_id: Option<&str> => "stationId",
        };

    fn get_datastream(datastream_id) => Get Organization "datastreams/{datastream_id}";

    fn list_datastream_historical(datastream_id) => Get Organization "datastreams/{datastream_id}/historical"
        query { start_epoch: i64 => "startEpoch", end_epoch: i64 => "endEpoch" };

    fn get_datastream_historical_by_id(datastream_id, datastream_historical_id) =>
        Get Organization "datastreams/{datastream_id}/historical/{datastream_historical_id}";

    fn update_datastream_metadata(datastream_id) =>
        Put Organization "datastreams/{datastream_id}/metadata" json metadata;

    fn get_datastream_datapoints(datastream_id) => Get Organization "datastreams/{datastream_id}/datapoints"
        query {
            start_epoch: i64 => "startEpoch",
            end_epoch: i64 => "endEpoch",
            brief: bool => "brief",
            limit: u32 => "limit",
        };

    fn get_datastream_datapoints_last(datastream_id) =>
        Get Organization "datastreams/{datastream_id}/datapoints/last";

    fn get_datastream_datapoints_count(datastream_id) =>
        Get Organization "datastreams/{datastream_id}/datapoints/count"
        query { start_epoch: i64 => "startEpoch", end_epoch: i64 => "endEpoch" };

    /// The service currently answers "no Route matched with those values".
    fn count_datastreams() => Get Organization "datastreams/count"
        query { asset_id: Option<&str> => "assetId", station_id: Option<&str> => "stationId" };

    fn list_datastreams_labels() => Get Organization "datastreams/labels"
        query { limit: u32 => "limit", start_after: Option<&str> => "startAfter" };

    // Groups and permissions

    fn list_groups() => Get Organization "groups";

    fn create_group() => Post Organization "groups" json metadata;

    fn get_group(group_id) => Get Organization "groups/{group_id}";

    /// `name` is required.
    fn update_group(group_id) => Put Organization "groups/{group_id}" json metadata;

    fn delete_group(group_id) => Delete Organization "groups/{group_id}";

    fn get_users_in_group(group_id) => Get Organization "groups/{group_id}/users";

    fn list_group_permissions(group_id) => Get Organization "groups/{group_id}/permissions";

    fn get_group_permission_by_id(group_id, permission_id) =>
        Get Organization "groups/{group_id}/permissions/{permission_id}";

    fn add_permission_to_group(group_id, permission_id) =>
        Put Organization "groups/{group_id}/permissions/{permission_id}";

    fn remove_permission_from_group(group_id, permission_id) =>
        Delete Organization "groups/{group_id}/permissions/{permission_id}";

    // Measurement library

    fn list_measurement_classification_types(measurement_type_id) =>
        Get Libraries "measurement-types/{measurement_type_id}";

    fn list_measurement_classification_systems() => Get Libraries "measurement-systems";

    fn get_measurement_classification_system_by_id(measurement_system_id) =>
        Get Libraries "measurement-systems/{measurement_system_id}";

    fn get_measurement_classification_conversions_by_id(classification_id, source_uom_id, target_uom_id) =>
        Get Libraries "measurement-conversions/{classification_id}/{source_uom_id}/{target_uom_id}";

    fn get_part(part_id) => Get Libraries "parts/{part_id}";

    // Organization

    fn get_organization_plan() => Get Organization "plan";

    fn switch_organization() => Put Organization "switch"
        body { new_organization_id: &str => "organization_id" };

    fn list_organizations() => Get Organizations "";

    fn create_product_registration() => Post ProductRegistrations ""
        body {
            content: &str => "content",
            signature: &str => "signature",
            signature_alg: &str => "signature_alg",
            nonce: &str => "nonce",
        };

    // Reach components

    fn get_reach_component_version_state(reach_component_id, reach_component_version_id) =>
        Get Organization "reach-components/{reach_component_id}/versions/{reach_component_version_id}/state";

    fn export_reach_component(reach_component_id, reach_component_version_id) =>
        Get Organization "reach-components/{reach_component_id}/versions/{reach_component_version_id}/export";

    // Station groups and stations

    fn list_station_groups() => Get Organization "station-groups";

    /// `name` is required.
    fn create_station_group() => Post Organization "station-groups" json metadata;

    fn get_station_group(station_group_id) => Get Organization "station-groups/{station_group_id}";

    /// Updates a station group; `name` is required.
    fn update_station(station_group_id) =>
        Put Organization "station-groups/{station_group_id}" json metadata;

    /// Succeeds with 200 rather than 204.
    fn delete_station_group(station_group_id) => Delete Organization "station-groups/{station_group_id}";

    /// Succeeds with 200. `$profile` and `$version` are required.
    fn update_station_group_metadata(station_group_id) =>
        Put Organization "station-groups/{station_group_id}/metadata" json metadata;

    fn list_stations() => Get Organization "stations";

    /// `name` is required.
    fn create_station() => Post Organization "stations" json metadata;

    fn preflight_create_station() => Options Organization "stations";

    fn get_station(station_id) => Get Organization "stations/{station_id}";

    fn delete_station(station_id) => Delete Organization "stations/{station_id}";

    fn get_station_state(station_id) => Get Organization "stations/{station_id}/state";

    fn list_station_historical(station_id) => Get Organization "stations/{station_id}/historical"
        query { start_epoch: i64 => "startEpoch", end_epoch: i64 => "endEpoch" };

    fn get_station_historical_by_id(station_id, station_historical_id) =>
        Get Organization "stations/{station_id}/historical/{station_historical_id}";

    /// The service currently answers "no Route matched with those values"
    /// even for valid requests.
    fn update_station_metadata(station_id) =>
        Put Organization "stations/{station_id}/metadata" json metadata;

    // Subscriptions

    fn list_subscriptions() => Get Organization "subscriptions";

    fn get_subscriptions(subscription_id) => Get Organization "subscriptions/{subscription_id}";

    fn update_subscription(subscription_id) => Put Organization "subscriptions/{subscription_id}"
        body { auto_renew: bool => "auto_renew", renewal_part: &str => "renewal_part" };

    fn delete_subscription(subscription_id) => Delete Organization "subscriptions/{subscription_id}";

    fn upgrade_subscription_part(subscription_id, part_id) =>
        Put Organization "subscriptions/{subscription_id}/parts/{part_id}";

    fn get_subscription_claim(billing_transaction_id) =>
        Get Organization "subscriptions-claims/{billing_transaction_id}";

    fn update_subscription_claims(billing_transaction_id) =>
        Put Organization "subscriptions-claims/{billing_transaction_id}"
        body { subscription_ids: &[String] => "subscription_ids" };

    fn get_subscription_organization() => Get Organization "subscription-organization";

    // Users

    fn list_users() => Get Organization "users";

    /// Which fields are required depends on the organization's permission
    /// setup.
    fn create_user() => Post Organization "users" body { metadata: &Value => "metadata" };

    fn get_user(user_id) => Get Organization "users/{user_id}";

    fn update_user(user_id) => Put Organization "users/{user_id}" body { metadata: &Value => "metadata" };

    fn delete_user(user_id) => Delete Organization "users/{user_id}";

    fn list_user_groups(user_id) => Get Organization "users/{user_id}/groups";

    fn count_user_groups(user_id) => Get Organization "users/{user_id}/groups/count";

    fn add_user_to_group(user_id, group_id) => Put Organization "users/{user_id}/groups/{group_id}";

    fn remove_user_from_group(user_id, group_id) => Delete Organization "users/{user_id}/groups/{group_id}";

    // Variables

    fn list_variables() => Get Organization "variables";

    fn create_variable() => Post Organization "variables"
        body { name: &str => "name", metadata: &Value => "metadata" };

    // Alerts

    fn list_alert_configurations() => Get Organization "alert-configurations";

    fn get_alert_configuration(alert_id) => Get Organization "alert-configurations/{alert_id}";

    fn delete_alert_configuration(alert_id) => Delete Organization "alert-configurations/{alert_id}";

    fn list_alert_configuration_historical(alert_id) =>
        Get Organization "alert-configurations/{alert_id}/historical"
        query {
            start_epoch: i64 => "startEpoch",
            end_epoch: i64 => "endEpoch",
            offset: u32 => "offset",
            limit: u32 => "limit",
        };

    fn get_alert_configuration_historical(alert_id, alert_historical_id) =>
        Get Organization "alert-configurations/{alert_id}/historical/{alert_historical_id}";

    fn list_alert_events() => Get Organization "alert-events"
        query {
            start_epoch: i64 => "startEpoch",
            end_epoch: i64 => "endEpoch",
            offset: u32 => "offset",
            alert_filter: &str => "filter",
        };

    fn get_alert_events_id(alert_event_id) => Get Organization "alert-events/{alert_event_id}";

    fn search_alert_events() => Post Organization "alert_events/search" json filters;

    fn list_alert_logs() => Get Organization "alert-logs"
        query {
            start_epoch: i64 => "startEpoch",
            end_epoch: i64 => "endEpoch",
            offset: u32 => "offset",
            limit: u32 => "limit",
            alert_filter: &str => "filter",
        };

    fn get_alert_logs_id(alert_log_id) => Get Organization "alert-logs/{alert_log_id}";

    fn search_alert_logs() => Post Organization "alert-log/search" json filters;

    // Dashboards

    fn list_dashboards() => Get Organization "dashboards"
        query {
            before: &str => "before",
            after: &str => "after",
            first: u32 => "first",
            last: u32 => "last",
            brief: bool => "brief",
            latest: bool => "latest",
        };

    fn create_dashboard() => Post Organization "dashboards" json metadata;

    fn get_dashboard(dashboard_id) => Get Organization "dashboards/{dashboard_id}"
        query { latest: bool => "latest" };

    fn update_dashboard(dashboard_id) => Put Organization "dashboards/{dashboard_id}" json metadata;

    fn delete_dashboard(dashboard_id) => Delete Organization "dashboard/{dashboard_id}";

    fn list_dashboard_historical(dashboard_id) => Get Organization "dashboards/{dashboard_id}/historical"
        query {
            before: Option<&str> => "before",
            after: Option<&str> => "after",
            first: u32 => "first",
            last: u32 => "last",
            reverse: Option<bool> => "reverse",
            brief: Option<bool> => "brief",
        };

    fn get_dashboard_historical_by_id(dashboard_id, dashboard_historical_id) =>
        Get Organization "dashboards/{dashboard_id}/historical/{dashboard_historical_id}";

    // Data collections

    fn list_data_collections() => Get Organization "data-collections/collections";

    fn create_data_collections() => Post Organization "data-collections/collections" json metadata;

    fn get_data_collection(data_collection_id) =>
        Get Organization "data-collections/collections/{data_collection_id}";

    fn update_data_collection(data_collection_id) =>
        Put Organization "data-collections/collections/{data_collection_id}" json metadata;

    fn delete_data_collection(data_collection_id) =>
        Delete Organization "data-collections/collections/{data_collection_id}";

    fn list_data_collection_types() => Get Organization "data-collections/types";

    fn create_data_collection_type() => Post Organization "data-collections/types" json metadata;

    fn get_data_collection_type(data_collection_type_id) =>
        Get Organization "data-collections/types/{data_collection_type_id}";

    fn update_data_collection_type(data_collection_type_id) =>
        Put Organization "data-collections/types/{data_collection_type_id}" json metadata;

    fn delete_data_collection_type(data_collection_type_id) =>
        Delete Organization "data-collections/types/{data_collection_type_id}";

    fn list_data_collection_type_historical(data_collection_type_id) =>
        Get Organization "data-collections/types/{data_collection_type_id}/historical";

    // Distribution groups

    fn list_distribution_groups() => Get Organization "distribution-groups";

    fn create_distribution_groups() => Post Organization "distribution-groups" json metadata;

    fn get_distribution_group(distribution_group_id) =>
        Get Organization "distribution-groups/{distribution_group_id}";

    fn update_distribution_group(distribution_group_id) =>
        Put Organization "distributions-groups/{distribution_group_id}" json metadata;

    fn delete_distribution_group(distribution_group_id) =>
        Delete Organization "distributions-groups/{distribution_group_id}";

    // Exports

    fn list_exports() => Get Organization "exports";

    fn create_export() => Post Organization "exports" json metadata;

    fn get_export(export_id) => Get Organization "exports/{export_id}";

    fn update_export(export_id) => Put Organization "exports/{export_id}" json metadata;

    fn delete_export(export_id) => Delete Organization "exports/{export_id}";

    fn list_export_jobs(export_id) => Get Organization "exports/{export_id}/jobs";

    fn get_export_job(export_id, export_job_id) => Get Organization "exports/{export_id}/jobs/{export_job_id}";

    fn delete_export_job(export_id, export_job_id) =>
        Delete Organization "exports/{export_id}/jobs/{export_job_id}";

    fn list_export_job_files(export_id, export_job_id) =>
        Get Organization "exports/{export_id}/jobs/{export_job_id}/files";

    fn get_export_job_file(export_id, export_job_id, export_file_id) =>
        Get Organization "exports/{export_id}/jobs/{export_job_id}/files/{export_file_id}";
}

pub const UPDATE_ASSET_SOFTWARE: EndpointDescriptor = descriptor!(
    update_asset_software(asset_id) Put Organization "assets/{asset_id}/software-packages"
    [] [] [json] []
);

pub const EXECUTE_ASSET_COMMAND: EndpointDescriptor = descriptor!(
    execute_asset_command(asset_id) Put Organization "assets/{asset_id}/commands"
    [] ["command", "parameters"] [] []
);

pub const UPDATE_DATASTREAM: EndpointDescriptor = descriptor!(
    update_datastream(datastream_id) Put Organization "datastreams/{datastream_id}"
    [] ["metadata"] [] []
);

pub const CREATE_ALERT_CONFIGURATION: EndpointDescriptor = descriptor!(
    create_alert_configuration() Post Organization "alert-configurations"
    [] [] [json] []
);

pub const UPDATE_ALERT_CONFIGURATION: EndpointDescriptor = descriptor!(
    update_alert_configuration(alert_id) Put Organization "alert-configuration/{alert_id}"
    [] [] [json] []
);

pub const CREATE_ALERT_LOG: EndpointDescriptor = descriptor!(
    create_alert_log() Post Organization "alert-logs"
    [] [] [json] []
);

pub const CREATE_SUBSCRIPTIONS: EndpointDescriptor = descriptor!(
    create_subscriptions() Post Organization "subscriptions"
    [] ["po_number", "organization_id", "subscriptions"] [] []
);

pub const REFRESH_TOKEN: EndpointDescriptor = descriptor!(
    refresh_token() Put Tokens "" [] ["refresh_token"] [] []
);

/// Descriptors of the operations built by hand below.
pub const CUSTOM: &[EndpointDescriptor] = &[
    TOKEN_EXCHANGE,
    REFRESH_TOKEN,
    UPDATE_ASSET_SOFTWARE,
    EXECUTE_ASSET_COMMAND,
    UPDATE_DATASTREAM,
    CREATE_ALERT_CONFIGURATION,
    UPDATE_ALERT_CONFIGURATION,
    CREATE_ALERT_LOG,
    CREATE_SUBSCRIPTIONS,
];

/// Every endpoint the client can call.
pub fn all_endpoints() -> impl Iterator<Item = &'static EndpointDescriptor> {
    GENERATED.iter().chain(CUSTOM.iter())
}

impl CampbellCloud {
    /// Raw token exchange. Construction already did this once; the result
    /// does not replace the client's header.
    pub fn create_token(
        &self,
        username: &str,
        password: &str,
        client_id: &str,
        grant_type: &str,
    ) -> Result<NormalizedResult, ApiError> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
            client_id: client_id.to_string(),
            grant_type: grant_type.to_string(),
        };
        self.request(&TOKEN_EXCHANGE, credentials.token_args()?)
    }

    /// Best effort only: the service rejects refresh requests, with or
    /// without credentials. The returned token, if any, is not adopted.
    pub fn refresh_token(&self) -> Result<NormalizedResult, ApiError> {
        self.request(&REFRESH_TOKEN, RequestArgs::new().field("refresh_token", "")?)
    }

    /// Push an OS or program package to a datalogger.
    ///
    /// `software_type` must be `"datalogger-os"` with `os_metadata`, or
    /// `"datalogger-program"` with `program_metadata`; anything else is
    /// rejected before a request is sent.
    pub fn update_asset_software(
        &self,
        asset_id: &str,
        software_type: &str,
        os_metadata: Option<&Value>,
        program_metadata: Option<&Value>,
    ) -> Result<NormalizedResult, ApiError> {
        let update = SoftwareUpdate::parse(software_type, os_metadata, program_metadata)?;
        self.send_software_update(asset_id, &update)
    }

    pub fn send_software_update(
        &self,
        asset_id: &str,
        update: &SoftwareUpdate,
    ) -> Result<NormalizedResult, ApiError> {
        let args = RequestArgs::new()
            .path("asset_id", asset_id)
            .header("x-campbell-software-type", update.software_type())
            .json(update.payload().clone());
        self.request(&UPDATE_ASSET_SOFTWARE, args)
    }

    pub fn execute_asset_command(
        &self,
        asset_id: &str,
        command: &str,
        start_epoch: i64,
        end_epoch: i64,
        table: &str,
    ) -> Result<NormalizedResult, ApiError> {
        let args = RequestArgs::new()
            .path("asset_id", asset_id)
            .field("command", command)?
            .field(
                "parameters",
                json!({"start_epoch": start_epoch, "end_epoch": end_epoch, "table": table}),
            )?;
        self.request(&EXECUTE_ASSET_COMMAND, args)
    }

    /// Stamp a datastream with a profile and version. The service also
    /// requires `field`, which is always sent as `"Temp"`.
    pub fn update_datastream(
        &self,
        datastream_id: &str,
        profile: &str,
        version: u32,
    ) -> Result<NormalizedResult, ApiError> {
        let args = RequestArgs::new().path("datastream_id", datastream_id).field(
            "metadata",
            json!({"$profile": profile, "$version": version, "field": "Temp"}),
        )?;
        self.request(&UPDATE_DATASTREAM, args)
    }

    /// Create an alert configuration carrying only the profile stamp.
    pub fn create_alert_configuration(&self) -> Result<NormalizedResult, ApiError> {
        let args = RequestArgs::new().json(Value::Object(alert_configuration_stamp()));
        self.request(&CREATE_ALERT_CONFIGURATION, args)
    }

    /// `metadata` is laid over `{"$profile": "configuration", "$version": 1}`
    /// and must be a JSON object.
    pub fn update_alert_configuration(
        &self,
        alert_id: &str,
        metadata: &Value,
    ) -> Result<NormalizedResult, ApiError> {
        let body = merge_object(alert_configuration_stamp(), metadata)?;
        let args = RequestArgs::new().path("alert_id", alert_id).json(body);
        self.request(&UPDATE_ALERT_CONFIGURATION, args)
    }

    /// `metadata` must be a JSON object; it is merged with `alert_event_id`.
    pub fn create_alert_log(
        &self,
        alert_event_id: &str,
        metadata: &Value,
    ) -> Result<NormalizedResult, ApiError> {
        let mut base = Map::new();
        base.insert("alert_event_id".to_string(), alert_event_id.into());
        let body = merge_object(base, metadata)?;
        self.request(&CREATE_ALERT_LOG, RequestArgs::new().json(body))
    }

    /// The organization id is taken from the session.
    pub fn create_subscriptions(
        &self,
        po_number: &str,
        subscriptions: &Value,
    ) -> Result<NormalizedResult, ApiError> {
        let args = RequestArgs::new()
            .field("po_number", po_number)?
            .field("organization_id", self.organization_id())?
            .field("subscriptions", subscriptions)?;
        self.request(&CREATE_SUBSCRIPTIONS, args)
    }
}
