use crate::{
    authentication::MaybeUser,
    data_formats::{AboutAuthorTemplate, AboutTechTemplate, HtmlTemplate},
};

pub async fn about_author(MaybeUser(current_user): MaybeUser) -> HtmlTemplate<AboutAuthorTemplate> {
    HtmlTemplate(AboutAuthorTemplate { current_user })
}

pub async fn about_tech(MaybeUser(current_user): MaybeUser) -> HtmlTemplate<AboutTechTemplate> {
    HtmlTemplate(AboutTechTemplate { current_user })
}
