pub mod master_config_dto;
