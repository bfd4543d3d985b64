//! DTO 模块
//!
//! 包含所有请求和响应的数据传输对象

pub mod request;
pub mod response;

pub use request::{
    AddChatDestinationRequest, CommentListParams, CreateCategoryRequest, CreateFeedbackRequest,
    CreateTagRequest, CreateUserRequest, FeedbackListParams, FeedbackTypeRequest,
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, ResolveRegistrationRequest,
    SubmitRegistrationRequest, TagListParams, UpdateCategoryRequest, UpdateTagRequest,
    UpdateUserRequest, UserListParams,
};

pub use response::{
    ApiResponse, CategoryDto, ChatDestinationDto, CommentDto, CsatDto, CursorPageDto,
    DeletedResponse, FeedbackDto, FeedbackTypeDto, RegistrationOutcomeDto,
    RegistrationRequestDto, RoleDto, TagDto, TagStatsDto, TokenDto, UserDto,
};
